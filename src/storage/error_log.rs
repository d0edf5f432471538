// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable log of failed token sweeps.
//!
//! One JSON object per line, appended and never rewritten. Operators read it
//! to reconcile withdrawals that were signed but not accepted by the node.

use std::path::PathBuf;
use std::sync::Mutex;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::files::{append_line, StorageError, StorageResult};

/// A single failed token sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepFailureRecord {
    pub record_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    /// Checksummed destination address
    pub destination: String,
    /// Checksummed token contract address
    pub token_contract: String,
    /// Balance read before building the transfer, base units
    pub token_balance: String,
    pub error: String,
}

impl SweepFailureRecord {
    pub fn new(
        user_id: impl Into<String>,
        destination: Address,
        token_contract: Address,
        token_balance: U256,
        error: impl Into<String>,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            destination: destination.to_checksum(None),
            token_contract: token_contract.to_checksum(None),
            token_balance: token_balance.to_string(),
            error: error.into(),
        }
    }
}

/// Append-only JSONL sink for [`SweepFailureRecord`]s.
#[derive(Debug)]
pub struct SweepErrorLog {
    path: PathBuf,
    // Serializes appends from this process
    write_lock: Mutex<()>,
}

impl SweepErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Append one record.
    pub fn append(&self, record: &SweepFailureRecord) -> StorageResult<()> {
        let line = serde_json::to_vec(record)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        append_line(&self.path, &line)
    }

    /// Read every record in append order. A missing log is empty.
    pub fn read_all(&self) -> StorageResult<Vec<SweepFailureRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StorageError::from))
            .collect()
    }
}
