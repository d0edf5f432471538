// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethereum JSON-RPC client for blockchain interactions.

use alloy::{
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;

use super::erc20::Erc20Contract;
use super::sweep::SignedTransaction;
use super::types::*;
use super::units::{format_amount, ETH_DECIMALS};

/// HTTP provider type for Ethereum (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Chain access needed by the sweep flows.
///
/// Every method is a single live RPC round trip; nothing is cached.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Network the endpoint serves.
    fn network(&self) -> &NetworkConfig;

    /// Native balance in wei.
    async fn native_balance(&self, owner: Address) -> Result<U256, EthClientError>;

    /// ERC-20 `balanceOf(owner)` in the token's base unit.
    async fn token_balance(&self, token: Address, owner: Address)
        -> Result<U256, EthClientError>;

    /// Current transaction count (next nonce) of an address.
    async fn transaction_count(&self, owner: Address) -> Result<u64, EthClientError>;

    /// Broadcast a signed transaction, returning its hash.
    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, EthClientError>;
}

/// Balance lookups for presentation, with token metadata.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn wallet_balances(
        &self,
        owner: Address,
        tokens: &[Address],
    ) -> Result<WalletBalanceResponse, EthClientError>;
}

/// Ethereum RPC client.
pub struct EthClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: HttpProvider,
}

impl EthClient {
    /// Create a new client for an RPC endpoint on the given network.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, EthClientError> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            EthClientError::InvalidRpcUrl(e.to_string())
        })?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    /// Get the native ETH balance for an address, for display.
    pub async fn get_native_balance(&self, owner: Address) -> Result<TokenBalance, EthClientError> {
        let balance = self.native_balance(owner).await?;

        Ok(TokenBalance {
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            balance_raw: balance.to_string(),
            balance_formatted: format_amount(balance, ETH_DECIMALS),
            decimals: ETH_DECIMALS,
            contract_address: None,
        })
    }

    /// Get the ERC-20 token balance for an address, for display.
    pub async fn get_token_balance(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<TokenBalance, EthClientError> {
        Erc20Contract::new(&self.provider, token).balance_of(owner).await
    }

    /// Get all balances (native + given tokens) for a wallet.
    pub async fn get_wallet_balances(
        &self,
        owner: Address,
        tokens: &[Address],
    ) -> Result<WalletBalanceResponse, EthClientError> {
        let native_balance = self.get_native_balance(owner).await?;

        let mut token_balances = Vec::new();
        for token in tokens {
            match self.get_token_balance(owner, *token).await {
                Ok(balance) => token_balances.push(balance),
                Err(e) => {
                    tracing::warn!(token = %token, error = %e, "Failed to get token balance");
                    // Continue with other tokens
                }
            }
        }

        Ok(WalletBalanceResponse {
            address: owner.to_checksum(None),
            network: self.network.name.to_string(),
            chain_id: self.network.chain_id,
            native_balance,
            token_balances,
        })
    }
}

#[async_trait]
impl BalanceSource for EthClient {
    async fn wallet_balances(
        &self,
        owner: Address,
        tokens: &[Address],
    ) -> Result<WalletBalanceResponse, EthClientError> {
        self.get_wallet_balances(owner, tokens).await
    }
}

#[async_trait]
impl ChainRpc for EthClient {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, EthClientError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| EthClientError::RpcError(e.to_string()))
    }

    async fn token_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<U256, EthClientError> {
        Erc20Contract::new(&self.provider, token)
            .raw_balance_of(owner)
            .await
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64, EthClientError> {
        self.provider
            .get_transaction_count(owner)
            .await
            .map_err(|e| EthClientError::RpcError(e.to_string()))
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, EthClientError> {
        let pending = self
            .provider
            .send_raw_transaction(tx.raw())
            .await
            // Prefer the node's own message ("nonce too low") over the wrapper text
            .map_err(|e| match e.as_error_resp() {
                Some(payload) => EthClientError::Rejected(payload.message.to_string()),
                None => EthClientError::Rejected(e.to_string()),
            })?;

        Ok(*pending.tx_hash())
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EthClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}
