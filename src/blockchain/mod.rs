// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethereum integration.
//!
//! This module provides functionality for:
//! - Querying native ETH and ERC-20 balances
//! - Fee-rate quotes from the gas oracle
//! - Signing and broadcasting withdraw-all sweeps

pub mod client;
pub mod erc20;
pub mod fee;
pub mod signing;
pub mod sweep;
pub mod types;
pub mod units;

pub use client::{BalanceSource, ChainRpc, EthClient, EthClientError};
pub use fee::{EtherscanGasOracle, FeeError, FeeEstimator, FeeQuote};
pub use signing::{LocalKeySigner, TransactionSigner};
pub use sweep::{Account, SweepAsset, SweepError, SweepReceipt, Sweeper};
pub use types::*;
