// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data directory:
//!
//! ```text
//! {data_dir}/
//!   keys/
//!     {user_id}.key          # Encrypted private key
//!   logs/
//!     sweep_errors.jsonl     # Failed token sweeps, append-only
//! ```

pub mod error_log;
pub mod files;
pub mod keystore;
pub mod paths;

pub use error_log::{SweepErrorLog, SweepFailureRecord};
pub use files::{FileStorage, StorageError, StorageResult};
pub use keystore::{validate_user_id, KeyStore, KeyStoreError};
pub use paths::StoragePaths;
