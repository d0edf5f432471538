// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account serialization of sweeps.
//!
//! A sweep reads the account nonce from the node and then submits. Two sweeps
//! of one account in flight at once would read the same nonce, so handlers
//! hold the account's guard for the whole sweep. Different accounts never
//! contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed async mutex, one slot per user id.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `user_id`'s account.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop slots nobody holds or waits on
            slots.retain(|key, slot| key == user_id || Arc::strong_count(slot) > 1);
            slots
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    /// Number of tracked slots.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
