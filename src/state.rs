// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::primitives::Address;

use crate::blockchain::{
    BalanceSource, ChainRpc, EthClient, EthClientError, EtherscanGasOracle, FeeError,
    FeeEstimator, NetworkConfig, Sweeper,
};
use crate::config::AppConfig;
use crate::sequencer::AccountLocks;
use crate::storage::{FileStorage, KeyStore, StorageError, StoragePaths, SweepErrorLog};

/// Failures while wiring the application at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Storage initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Rpc(#[from] EthClientError),

    #[error(transparent)]
    Oracle(#[from] FeeError),
}

#[derive(Clone)]
pub struct AppState {
    pub storage: FileStorage,
    pub keys: Arc<KeyStore>,
    pub chain: Arc<dyn ChainRpc>,
    pub balances: Arc<dyn BalanceSource>,
    pub sweeper: Arc<Sweeper>,
    pub locks: Arc<AccountLocks>,
    /// ERC-20 swept by the token withdraw endpoint
    pub token_contract: Address,
}

impl AppState {
    pub fn new(
        storage: FileStorage,
        keys: KeyStore,
        chain: Arc<dyn ChainRpc>,
        balances: Arc<dyn BalanceSource>,
        fees: Arc<dyn FeeEstimator>,
        token_contract: Address,
    ) -> Self {
        let error_log = Arc::new(SweepErrorLog::new(storage.paths().sweep_error_log()));
        let sweeper = Arc::new(Sweeper::new(chain.clone(), fees, error_log));

        Self {
            storage,
            keys: Arc::new(keys),
            chain,
            balances,
            sweeper,
            locks: Arc::new(AccountLocks::new()),
            token_contract,
        }
    }

    /// Build production state: data directory, RPC client and gas oracle.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let mut storage = FileStorage::new(StoragePaths::new(&config.data_dir));
        storage.initialize()?;

        let keys = KeyStore::new(storage.clone(), &config.key_encryption_secret);
        let client = Arc::new(EthClient::new(config.network.clone(), &config.rpc_endpoint)?);
        let oracle = EtherscanGasOracle::new(&config.oracle_url, &config.oracle_api_key)?;

        Ok(Self::new(
            storage,
            keys,
            client.clone(),
            client,
            Arc::new(oracle),
            config.token_contract,
        ))
    }

    pub fn network(&self) -> &NetworkConfig {
        self.chain.network()
    }
}
