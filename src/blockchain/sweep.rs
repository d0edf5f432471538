// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Withdraw-all ("sweep") flows for native ETH and ERC-20 tokens.
//!
//! Both flows run the same linear sequence:
//!
//! ```text
//! Idle -> FeeQuoted -> RequestBuilt -> Signed -> Submitted -> {hash returned | Rejected}
//! ```
//!
//! Any failure aborts the call; nothing is retried or resumed.
//!
//! ## Concurrency
//!
//! The nonce is read from the node right before signing. Two sweeps of the
//! same account running at once can read the same nonce and one of them will
//! be rejected. Callers must serialize sweeps per account (see
//! [`crate::sequencer::AccountLocks`]).

use std::sync::Arc;

use alloy::{
    consensus::TxLegacy,
    primitives::{Address, Bytes, TxKind, B256, U256},
};
use serde::Serialize;
use utoipa::ToSchema;

use super::client::{ChainRpc, EthClientError};
use super::erc20::encode_transfer;
use super::fee::{FeeError, FeeEstimator, FeeQuote};
use super::signing::{sign_legacy, SigningError, TransactionSigner};
use super::types::SWEEP_GAS_LIMIT;
use crate::storage::{SweepErrorLog, SweepFailureRecord};

/// A custodial signing identity.
#[derive(Clone)]
pub struct Account {
    /// Owner of the key (chat user id in the front-end)
    pub user_id: String,
    signer: Arc<dyn TransactionSigner>,
}

impl Account {
    pub fn new(user_id: impl Into<String>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            user_id: user_id.into(),
            signer,
        }
    }

    /// Address derived from the account's key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &dyn TransactionSigner {
        self.signer.as_ref()
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("address", &self.address())
            .finish()
    }
}

/// Asset moved by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SweepAsset {
    Native,
    Token,
}

/// Intent to send the whole native balance minus the reserved fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransferRequest {
    pub destination: Address,
    pub gas_limit: u64,
    pub fee_rate: u128,
    pub nonce: u64,
    pub value: U256,
}

/// Intent to transfer the full token balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferRequest {
    pub destination: Address,
    pub token_contract: Address,
    /// ABI-encoded `transfer(destination, amount)`
    pub data: Bytes,
    pub gas_limit: u64,
    pub fee_rate: u128,
    pub nonce: u64,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    Native(NativeTransferRequest),
    Token(TokenTransferRequest),
}

impl TransferRequest {
    /// Unsigned legacy transaction for this request.
    fn to_legacy(&self, chain_id: u64) -> TxLegacy {
        match self {
            TransferRequest::Native(req) => TxLegacy {
                chain_id: Some(chain_id),
                nonce: req.nonce,
                gas_price: req.fee_rate,
                gas_limit: req.gas_limit,
                to: TxKind::Call(req.destination),
                value: req.value,
                input: Bytes::new(),
            },
            TransferRequest::Token(req) => TxLegacy {
                chain_id: Some(chain_id),
                nonce: req.nonce,
                gas_price: req.fee_rate,
                gas_limit: req.gas_limit,
                to: TxKind::Call(req.token_contract),
                // token transfers move no ether
                value: U256::ZERO,
                input: req.data.clone(),
            },
        }
    }
}

/// A transaction ready for broadcast. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
    hash: B256,
    request: TransferRequest,
}

impl SignedTransaction {
    /// EIP-2718 encoded bytes.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn request(&self) -> &TransferRequest {
        &self.request
    }
}

/// Successful sweep result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReceipt {
    pub asset: SweepAsset,
    pub tx_hash: B256,
    pub explorer_url: String,
    /// Wei for native sweeps, token base units for token sweeps
    pub amount: U256,
    pub fee_rate: u128,
    pub nonce: u64,
}

/// Sweep failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    #[error(transparent)]
    NoQuote(#[from] FeeError),

    #[error("Insufficient funds: balance {balance} wei cannot cover reserved fee {reserved_fee} wei")]
    InsufficientFunds { balance: U256, reserved_fee: U256 },

    #[error("Transaction rejected: {0}")]
    SubmissionRejected(String),

    #[error("No key stored for user {0}")]
    KeyNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl From<SigningError> for SweepError {
    fn from(e: SigningError) -> Self {
        SweepError::Signing(e.to_string())
    }
}

fn network_error(e: EthClientError) -> SweepError {
    SweepError::Network(e.to_string())
}

fn rejected(e: EthClientError) -> SweepError {
    match e {
        EthClientError::Rejected(reason) => SweepError::SubmissionRejected(reason),
        other => SweepError::SubmissionRejected(other.to_string()),
    }
}

/// Amount left after reserving `gas_limit * fee_rate` from `balance`.
pub fn spendable_native_value(
    balance: U256,
    gas_limit: u64,
    fee_rate: u128,
) -> Result<U256, SweepError> {
    let reserved_fee = U256::from(gas_limit) * U256::from(fee_rate);
    balance
        .checked_sub(reserved_fee)
        .ok_or(SweepError::InsufficientFunds {
            balance,
            reserved_fee,
        })
}

/// Runs the withdraw-all flows against a chain endpoint and fee oracle.
pub struct Sweeper {
    rpc: Arc<dyn ChainRpc>,
    fees: Arc<dyn FeeEstimator>,
    error_log: Arc<SweepErrorLog>,
}

impl Sweeper {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        fees: Arc<dyn FeeEstimator>,
        error_log: Arc<SweepErrorLog>,
    ) -> Self {
        Self {
            rpc,
            fees,
            error_log,
        }
    }

    /// Send the entire native balance of `account`, net of the reserved fee.
    pub async fn sweep_native(
        &self,
        account: &Account,
        destination: Address,
    ) -> Result<SweepReceipt, SweepError> {
        let from = account.address();

        let balance = self.rpc.native_balance(from).await.map_err(network_error)?;
        let quote = self.fees.estimate_fee().await?;

        let value = spendable_native_value(balance, SWEEP_GAS_LIMIT, quote.fee_rate)?;
        let nonce = self.rpc.transaction_count(from).await.map_err(network_error)?;

        let request = TransferRequest::Native(NativeTransferRequest {
            destination,
            gas_limit: SWEEP_GAS_LIMIT,
            fee_rate: quote.fee_rate,
            nonce,
            value,
        });

        let signed = self.sign(account, request)?;
        tracing::info!(
            user_id = %account.user_id,
            from = %from,
            to = %destination,
            value = %value,
            fee_rate = quote.fee_rate,
            nonce,
            "Submitting native sweep"
        );

        let tx_hash = self
            .rpc
            .send_raw_transaction(&signed)
            .await
            .map_err(rejected)?;

        Ok(self.receipt(SweepAsset::Native, tx_hash, value, &quote, nonce))
    }

    /// Transfer the entire `token_contract` balance of `account`.
    ///
    /// Submission failures are appended to the sweep error log before the
    /// error is returned.
    pub async fn sweep_token(
        &self,
        account: &Account,
        destination: Address,
        token_contract: Address,
    ) -> Result<SweepReceipt, SweepError> {
        let from = account.address();

        let amount = self
            .rpc
            .token_balance(token_contract, from)
            .await
            .map_err(network_error)?;
        let quote = self.fees.estimate_fee().await?;
        let nonce = self.rpc.transaction_count(from).await.map_err(network_error)?;

        let request = TransferRequest::Token(TokenTransferRequest {
            destination,
            token_contract,
            data: encode_transfer(destination, amount),
            gas_limit: SWEEP_GAS_LIMIT,
            fee_rate: quote.fee_rate,
            nonce,
            amount,
        });

        let signed = self.sign(account, request)?;
        tracing::info!(
            user_id = %account.user_id,
            from = %from,
            to = %destination,
            token = %token_contract,
            amount = %amount,
            fee_rate = quote.fee_rate,
            nonce,
            "Submitting token sweep"
        );

        match self.rpc.send_raw_transaction(&signed).await {
            Ok(tx_hash) => Ok(self.receipt(SweepAsset::Token, tx_hash, amount, &quote, nonce)),
            Err(e) => {
                let err = rejected(e);
                let record = SweepFailureRecord::new(
                    &account.user_id,
                    destination,
                    token_contract,
                    amount,
                    err.to_string(),
                );
                if let Err(log_err) = self.error_log.append(&record) {
                    tracing::error!(
                        user_id = %account.user_id,
                        error = %log_err,
                        "Failed to persist token sweep failure"
                    );
                }
                tracing::warn!(user_id = %account.user_id, error = %err, "Token sweep rejected");
                Err(err)
            }
        }
    }

    fn sign(
        &self,
        account: &Account,
        request: TransferRequest,
    ) -> Result<SignedTransaction, SweepError> {
        let tx = request.to_legacy(self.rpc.network().chain_id);
        let (raw, hash) = sign_legacy(account.signer(), tx)?;
        Ok(SignedTransaction { raw, hash, request })
    }

    fn receipt(
        &self,
        asset: SweepAsset,
        tx_hash: B256,
        amount: U256,
        quote: &FeeQuote,
        nonce: u64,
    ) -> SweepReceipt {
        SweepReceipt {
            asset,
            tx_hash,
            explorer_url: self.rpc.network().tx_url(&tx_hash.to_string()),
            amount,
            fee_rate: quote.fee_rate,
            nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::erc20::IERC20;
    use crate::blockchain::signing::LocalKeySigner;
    use crate::blockchain::types::{NetworkConfig, ETH_MAINNET};
    use alloy::{
        consensus::{Transaction, TxEnvelope},
        eips::eip2718::Decodable2718,
        primitives::address,
        sol_types::SolCall,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const DEV_KEY: [u8; 32] = [
        0xac, 0x09, 0x74, 0xbe, 0xc3, 0x9a, 0x17, 0xe3, 0x6b, 0xa4, 0xa6, 0xb4, 0xd2, 0x38, 0xff,
        0x94, 0x4b, 0xac, 0xb4, 0x78, 0xcb, 0xed, 0x5e, 0xfc, 0xae, 0x78, 0x4d, 0x7b, 0xf4, 0xf2,
        0xff, 0x80,
    ];
    const DEST: Address = address!("00000000000000000000000000000000000000aa");
    const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
    const ONE_ETH: u64 = 1_000_000_000_000_000_000;

    /// In-memory chain: fixed balances, a nonce that advances on every
    /// accepted submission, and an optional forced rejection. Like a node it
    /// refuses a transaction whose nonce was already used.
    struct FakeChain {
        network: NetworkConfig,
        native: U256,
        token: U256,
        nonce: Mutex<u64>,
        nonce_reads: Mutex<u32>,
        reject_with: Option<String>,
        submitted: Mutex<Vec<SignedTransaction>>,
    }

    impl FakeChain {
        fn new(native: U256, token: U256) -> Self {
            Self {
                network: ETH_MAINNET,
                native,
                token,
                nonce: Mutex::new(4),
                nonce_reads: Mutex::new(0),
                reject_with: None,
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(mut self, reason: &str) -> Self {
            self.reject_with = Some(reason.to_string());
            self
        }

        fn submitted(&self) -> Vec<SignedTransaction> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChainRpc for FakeChain {
        fn network(&self) -> &NetworkConfig {
            &self.network
        }

        async fn native_balance(&self, _owner: Address) -> Result<U256, EthClientError> {
            Ok(self.native)
        }

        async fn token_balance(
            &self,
            _token: Address,
            _owner: Address,
        ) -> Result<U256, EthClientError> {
            Ok(self.token)
        }

        async fn transaction_count(&self, _owner: Address) -> Result<u64, EthClientError> {
            *self.nonce_reads.lock().unwrap() += 1;
            let nonce = *self.nonce.lock().unwrap();
            // Let other sweeps run between the read and the submission
            tokio::task::yield_now().await;
            Ok(nonce)
        }

        async fn send_raw_transaction(
            &self,
            tx: &SignedTransaction,
        ) -> Result<B256, EthClientError> {
            self.submitted.lock().unwrap().push(tx.clone());
            if let Some(reason) = &self.reject_with {
                return Err(EthClientError::Rejected(reason.clone()));
            }
            let tx_nonce = match tx.request() {
                TransferRequest::Native(req) => req.nonce,
                TransferRequest::Token(req) => req.nonce,
            };
            let mut nonce = self.nonce.lock().unwrap();
            if tx_nonce < *nonce {
                return Err(EthClientError::Rejected("nonce too low".to_string()));
            }
            *nonce = tx_nonce + 1;
            Ok(tx.hash())
        }
    }

    struct FixedFee(Result<u128, FeeError>);

    #[async_trait]
    impl FeeEstimator for FixedFee {
        async fn estimate_fee(&self) -> Result<FeeQuote, FeeError> {
            self.0.clone().map(|fee_rate| FeeQuote {
                fee_rate,
                fetched_at: Utc::now(),
            })
        }
    }

    struct Harness {
        _temp: TempDir,
        chain: Arc<FakeChain>,
        log: Arc<SweepErrorLog>,
        sweeper: Sweeper,
        account: Account,
    }

    fn harness(chain: FakeChain, fee: Result<u128, FeeError>) -> Harness {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(SweepErrorLog::new(temp.path().join("sweep_errors.jsonl")));
        let chain = Arc::new(chain);
        let sweeper = Sweeper::new(chain.clone(), Arc::new(FixedFee(fee)), log.clone());
        let signer = LocalKeySigner::from_slice(&DEV_KEY).unwrap();
        Harness {
            _temp: temp,
            chain,
            log,
            sweeper,
            account: Account::new("42", Arc::new(signer)),
        }
    }

    fn decode(signed: &SignedTransaction) -> TxEnvelope {
        TxEnvelope::decode_2718(&mut signed.raw().as_ref()).unwrap()
    }

    #[test]
    fn one_eth_at_fifty_wei_per_gas() {
        let value = spendable_native_value(U256::from(ONE_ETH), 210_000, 50).unwrap();
        // 210_000 * 50 = 10_500_000 wei reserved
        assert_eq!(value, U256::from(999_999_999_989_500_000u64));
    }

    #[test]
    fn exact_fee_leaves_zero() {
        let value = spendable_native_value(U256::from(10_500_000u64), 210_000, 50).unwrap();
        assert_eq!(value, U256::ZERO);
    }

    #[test]
    fn balance_below_fee_is_insufficient() {
        let err = spendable_native_value(U256::from(10_499_999u64), 210_000, 50).unwrap_err();
        assert_eq!(
            err,
            SweepError::InsufficientFunds {
                balance: U256::from(10_499_999u64),
                reserved_fee: U256::from(10_500_000u64),
            }
        );
    }

    #[tokio::test]
    async fn native_sweep_drains_balance_minus_fee() {
        let h = harness(FakeChain::new(U256::from(ONE_ETH), U256::ZERO), Ok(50));

        let receipt = h.sweeper.sweep_native(&h.account, DEST).await.unwrap();
        assert_eq!(receipt.asset, SweepAsset::Native);
        assert_eq!(receipt.amount, U256::from(999_999_999_989_500_000u64));
        assert_eq!(receipt.nonce, 4);
        assert!(receipt.explorer_url.starts_with("https://etherscan.io/tx/0x"));

        let submitted = h.chain.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(receipt.tx_hash, submitted[0].hash());

        let tx = decode(&submitted[0]);
        assert_eq!(tx.to(), Some(DEST));
        assert_eq!(tx.value(), receipt.amount);
        assert_eq!(tx.gas_limit(), SWEEP_GAS_LIMIT);
        assert_eq!(tx.gas_price(), Some(50));
        assert_eq!(tx.nonce(), 4);
        assert_eq!(tx.chain_id(), Some(1));
        assert!(tx.input().is_empty());
    }

    #[tokio::test]
    async fn native_sweep_with_too_little_balance_submits_nothing() {
        let h = harness(FakeChain::new(U256::from(1_000u64), U256::ZERO), Ok(50));

        let err = h.sweeper.sweep_native(&h.account, DEST).await.unwrap_err();
        assert!(matches!(err, SweepError::InsufficientFunds { .. }));
        assert!(h.chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn missing_quote_aborts_both_flows() {
        let no_quote = FeeError::NoQuote("HTTP 500 Internal Server Error from gas oracle".into());
        let h = harness(
            FakeChain::new(U256::from(ONE_ETH), U256::from(5u64)),
            Err(no_quote.clone()),
        );

        let native = h.sweeper.sweep_native(&h.account, DEST).await.unwrap_err();
        assert_eq!(native, SweepError::NoQuote(no_quote.clone()));

        let token = h.sweeper.sweep_token(&h.account, DEST, USDT).await.unwrap_err();
        assert_eq!(token, SweepError::NoQuote(no_quote));

        assert!(h.chain.submitted().is_empty());
        assert!(h.log.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn native_rejection_is_reported_but_not_logged() {
        let chain = FakeChain::new(U256::from(ONE_ETH), U256::ZERO).rejecting("nonce too low");
        let h = harness(chain, Ok(50));

        let err = h.sweeper.sweep_native(&h.account, DEST).await.unwrap_err();
        assert_eq!(err, SweepError::SubmissionRejected("nonce too low".to_string()));
        assert!(h.log.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn token_sweep_transfers_exact_balance() {
        let balance = U256::from(123_456_789u64);
        let h = harness(FakeChain::new(U256::from(ONE_ETH), balance), Ok(30));

        let receipt = h
            .sweeper
            .sweep_token(&h.account, DEST, USDT)
            .await
            .unwrap();
        assert_eq!(receipt.asset, SweepAsset::Token);
        assert_eq!(receipt.amount, balance);

        let submitted = h.chain.submitted();
        let tx = decode(&submitted[0]);
        assert_eq!(tx.to(), Some(USDT));
        assert_eq!(tx.value(), U256::ZERO);
        assert_eq!(tx.gas_limit(), SWEEP_GAS_LIMIT);

        let call = IERC20::transferCall::abi_decode(tx.input()).unwrap();
        assert_eq!(call.to, DEST);
        assert_eq!(call.amount, balance);

        match submitted[0].request() {
            TransferRequest::Token(req) => {
                assert_eq!(req.amount, balance);
                assert_eq!(req.token_contract, USDT);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_token_balance_is_still_submitted() {
        let h = harness(FakeChain::new(U256::from(ONE_ETH), U256::ZERO), Ok(30));

        let receipt = h
            .sweeper
            .sweep_token(&h.account, DEST, USDT)
            .await
            .unwrap();
        assert_eq!(receipt.amount, U256::ZERO);

        let tx = decode(&h.chain.submitted()[0]);
        let call = IERC20::transferCall::abi_decode(tx.input()).unwrap();
        assert_eq!(call.amount, U256::ZERO);
    }

    #[tokio::test]
    async fn token_rejection_is_logged_with_balance() {
        let chain = FakeChain::new(U256::from(ONE_ETH), U256::from(777u64)).rejecting("nonce too low");
        let h = harness(chain, Ok(30));

        let err = h
            .sweeper
            .sweep_token(&h.account, DEST, USDT)
            .await
            .unwrap_err();
        assert_eq!(err, SweepError::SubmissionRejected("nonce too low".to_string()));

        let records = h.log.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "42");
        assert_eq!(records[0].destination, DEST.to_checksum(None));
        assert_eq!(records[0].token_contract, USDT.to_checksum(None));
        assert_eq!(records[0].token_balance, "777");
        assert!(records[0].error.contains("nonce too low"));
    }

    #[tokio::test]
    async fn sequential_sweeps_read_fresh_nonces() {
        let h = harness(FakeChain::new(U256::from(ONE_ETH), U256::from(10u64)), Ok(1));

        let first = h.sweeper.sweep_native(&h.account, DEST).await.unwrap();
        let second = h.sweeper.sweep_token(&h.account, DEST, USDT).await.unwrap();

        assert_eq!(first.nonce, 4);
        assert_eq!(second.nonce, 5);
        assert_eq!(*h.chain.nonce_reads.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_sweeps_of_one_account_race_on_nonce() {
        let h = harness(FakeChain::new(U256::from(ONE_ETH), U256::from(10u64)), Ok(1));

        let (first, second) = tokio::join!(
            h.sweeper.sweep_native(&h.account, DEST),
            h.sweeper.sweep_native(&h.account, DEST),
        );

        // Both read nonce 4; the node accepts only the first submission
        let rejected = SweepError::SubmissionRejected("nonce too low".to_string());
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| r.as_ref().err() == Some(&rejected)));
        assert_eq!(h.chain.submitted().len(), 2);
    }
}
