// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::client::EthClientError;
use super::types::TokenBalance;
use super::units::format_amount;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// ABI-encode a `transfer(to, amount)` call for use as transaction input.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
    address: Address,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    /// Create a new ERC-20 contract instance.
    pub fn new(provider: &P, address: Address) -> Self {
        let contract = IERC20::new(address, provider.clone());
        Self { contract, address }
    }

    /// Get the token name.
    pub async fn name(&self) -> Result<String, EthClientError> {
        self.contract
            .name()
            .call()
            .await
            .map_err(|e| EthClientError::ContractError(e.to_string()))
    }

    /// Get the token symbol.
    pub async fn symbol(&self) -> Result<String, EthClientError> {
        self.contract
            .symbol()
            .call()
            .await
            .map_err(|e| EthClientError::ContractError(e.to_string()))
    }

    /// Get the token decimals.
    pub async fn decimals(&self) -> Result<u8, EthClientError> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(|e| EthClientError::ContractError(e.to_string()))
    }

    /// Raw `balanceOf` in the token's base unit.
    pub async fn raw_balance_of(&self, owner: Address) -> Result<U256, EthClientError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| EthClientError::ContractError(e.to_string()))
    }

    /// Balance of an address with token metadata, for display.
    pub async fn balance_of(&self, owner: Address) -> Result<TokenBalance, EthClientError> {
        // Metadata is cosmetic; fall back rather than fail the lookup
        let name: String = self.name().await.unwrap_or_else(|_| "Unknown".to_string());
        let symbol: String = self.symbol().await.unwrap_or_else(|_| "???".to_string());
        let decimals: u8 = self.decimals().await.unwrap_or(18);

        let balance = self.raw_balance_of(owner).await?;

        Ok(TokenBalance {
            symbol,
            name,
            balance_raw: balance.to_string(),
            balance_formatted: format_amount(balance, decimals),
            decimals,
            contract_address: Some(self.address.to_checksum(None)),
        })
    }
}
