// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial key store.
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/keys/{user_id}.key   # nonce (12B) || ChaCha20-Poly1305(PKCS#8 PEM)
//! ```
//!
//! ## Security
//!
//! - The encryption key is SHA-256 over the configured secret and a domain tag
//! - The user id is bound as associated data, so a key file copied to another
//!   user's path fails to decrypt
//! - Private keys never leave this module except inside a signer

use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use sha2::{Digest, Sha256};

use super::files::{FileStorage, StorageError};
use crate::blockchain::signing::{generate_keypair, LocalKeySigner, SigningError};
use crate::blockchain::sweep::{Account, SweepError};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_DOMAIN: &[u8] = b"relational-sweep.v1.key-encryption";
const MAX_USER_ID_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("A wallet already exists for user {0}")]
    AlreadyExists(String),

    #[error("No wallet found for user {0}")]
    NotFound(String),

    #[error("Key file for user {0} could not be decrypted")]
    Corrupted(String),

    #[error(transparent)]
    Key(#[from] SigningError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<KeyStoreError> for SweepError {
    fn from(e: KeyStoreError) -> Self {
        match e {
            KeyStoreError::NotFound(user_id) => SweepError::KeyNotFound(user_id),
            other => SweepError::Signing(other.to_string()),
        }
    }
}

/// Accept `[A-Za-z0-9_-]{1,64}` so ids are safe as file names.
pub fn validate_user_id(user_id: &str) -> Result<(), KeyStoreError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(KeyStoreError::InvalidUserId(user_id.to_string()))
    }
}

/// Encrypted per-user key files.
#[derive(Clone)]
pub struct KeyStore {
    storage: FileStorage,
    cipher: ChaCha20Poly1305,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("keys_dir", &self.storage.paths().keys_dir())
            .finish_non_exhaustive()
    }
}

impl KeyStore {
    pub fn new(storage: FileStorage, secret: &str) -> Self {
        Self {
            storage,
            cipher: ChaCha20Poly1305::new(&derive_key(secret)),
        }
    }

    /// Whether `user_id` already has a key.
    pub fn exists(&self, user_id: &str) -> bool {
        validate_user_id(user_id).is_ok()
            && self.storage.exists(self.storage.paths().user_key(user_id))
    }

    /// Create and persist a fresh key for `user_id`, returning its address.
    pub fn generate(&self, user_id: &str) -> Result<Address, KeyStoreError> {
        validate_user_id(user_id)?;
        if self.exists(user_id) {
            return Err(KeyStoreError::AlreadyExists(user_id.to_string()));
        }

        let (pem, address) = generate_keypair()?;
        let sealed = self.seal(user_id, pem.as_bytes())?;

        self.storage
            .write_new(self.storage.paths().user_key(user_id), &sealed)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => KeyStoreError::AlreadyExists(user_id.to_string()),
                other => KeyStoreError::Storage(other.to_string()),
            })?;

        tracing::info!(user_id = %user_id, address = %address, "Generated custodial key");
        Ok(address)
    }

    /// Address of the stored key.
    pub fn address(&self, user_id: &str) -> Result<Address, KeyStoreError> {
        Ok(self.load_account(user_id)?.address())
    }

    /// Decrypt the stored key into a signing account.
    pub fn load_account(&self, user_id: &str) -> Result<Account, KeyStoreError> {
        validate_user_id(user_id)?;

        let sealed = self
            .storage
            .read_raw(self.storage.paths().user_key(user_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => KeyStoreError::NotFound(user_id.to_string()),
                other => KeyStoreError::Storage(other.to_string()),
            })?;

        let pem = self.open(user_id, &sealed)?;
        let signer = LocalKeySigner::from_pem(&pem)?;
        Ok(Account::new(user_id, Arc::new(signer)))
    }

    fn seal(&self, user_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: user_id.as_bytes(),
                },
            )
            .map_err(|e| KeyStoreError::Storage(format!("encryption failed: {e}")))?;

        let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        packed.extend_from_slice(&nonce);
        packed.extend_from_slice(&ciphertext);
        Ok(packed)
    }

    fn open(&self, user_id: &str, packed: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        if packed.len() < NONCE_LEN + TAG_LEN {
            return Err(KeyStoreError::Corrupted(user_id.to_string()));
        }

        let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: user_id.as_bytes(),
                },
            )
            .map_err(|_| KeyStoreError::Corrupted(user_id.to_string()))
    }
}

fn derive_key(secret: &str) -> Key {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(KEY_DOMAIN);
    let digest = hasher.finalize();
    *Key::from_slice(&digest)
}
