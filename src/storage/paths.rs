// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk data layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent data.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Key Paths ==========

    /// Directory containing encrypted user keys.
    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    /// Path to a user's encrypted key file.
    pub fn user_key(&self, user_id: &str) -> PathBuf {
        self.keys_dir().join(format!("{user_id}.key"))
    }

    // ========== Log Paths ==========

    /// Directory containing durable logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Append-only log of failed token sweeps (JSONL).
    pub fn sweep_error_log(&self) -> PathBuf {
        self.logs_dir().join("sweep_errors.jsonl")
    }
}
