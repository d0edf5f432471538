// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Gas limit reserved for every sweep transaction.
///
/// Used for both native transfers and ERC-20 `transfer` calls. It is not
/// scaled for contract complexity and not estimated from the node.
pub const SWEEP_GAS_LIMIT: u64 = 210_000;

/// Ethereum network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum Mainnet configuration.
pub const ETH_MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    chain_id: 1,
    explorer_url: "https://etherscan.io",
};

/// Ethereum Sepolia Testnet configuration.
pub const ETH_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Ethereum Sepolia Testnet",
    chain_id: 11_155_111,
    explorer_url: "https://sepolia.etherscan.io",
};

/// Resolve a network identifier (`mainnet` or `sepolia`).
pub fn network_by_name(raw: &str) -> Result<NetworkConfig, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mainnet" => Ok(ETH_MAINNET),
        "sepolia" => Ok(ETH_SEPOLIA),
        other => Err(format!(
            "Unsupported network `{other}` (expected `mainnet` or `sepolia`)"
        )),
    }
}

impl NetworkConfig {
    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Token balance information.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Token symbol (e.g., "ETH", "USDT")
    pub symbol: String,
    /// Token name
    pub name: String,
    /// Balance in smallest unit (wei for native, token decimals for ERC-20)
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Contract address (None for native token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

/// Wallet balance response including native and token balances.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletBalanceResponse {
    /// Wallet address
    pub address: String,
    /// Network name
    pub network: String,
    /// Chain ID
    pub chain_id: u64,
    /// Native token balance (ETH)
    pub native_balance: TokenBalance,
    /// ERC-20 token balances
    pub token_balances: Vec<TokenBalance>,
}

/// Known ERC-20 token.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    /// Mainnet contract address
    pub mainnet_address: Option<&'static str>,
    /// Sepolia testnet contract address
    pub sepolia_address: Option<&'static str>,
}

impl Erc20Token {
    /// Contract address of this token on the given network, if deployed.
    pub fn address_on(&self, network: &NetworkConfig) -> Option<&'static str> {
        match network.chain_id {
            1 => self.mainnet_address,
            11_155_111 => self.sepolia_address,
            _ => None,
        }
    }
}

/// Tether USD, the stablecoin swept by the withdraw-token flow by default.
pub const USDT_TOKEN: Erc20Token = Erc20Token {
    mainnet_address: Some("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
    // No canonical Tether deployment on Sepolia; set TOKEN_CONTRACT instead.
    sepolia_address: None,
};
