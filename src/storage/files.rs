// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plain filesystem operations under the data directory.
//!
//! Secrets are encrypted by their owners (see [`super::keystore`]) before they
//! reach this layer; nothing here does any crypto.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use super::StoragePaths;

/// Error type for storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Entity not found
    NotFound(String),
    /// Entity already exists
    AlreadyExists(String),
    /// Storage not initialized
    NotInitialized,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "JSON error: {e}"),
            StorageError::NotFound(entity) => write!(f, "Not found: {entity}"),
            StorageError::AlreadyExists(entity) => write!(f, "Already exists: {entity}"),
            StorageError::NotInitialized => write!(f, "Storage not initialized"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl FileStorage {
    /// Create a new FileStorage instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create all required directories. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        for dir in [self.paths.keys_dir(), self.paths.logs_dir()] {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete probe of the data directory.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "health check data mismatch",
            )));
        }

        Ok(())
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Write raw bytes to a file that must not exist yet.
    ///
    /// Fails with [`StorageError::AlreadyExists`] instead of overwriting.
    pub fn write_new(&self, path: impl AsRef<Path>, data: &[u8]) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    /// Read raw bytes from a file.
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Append one line to a file with a single `O_APPEND` write.
pub fn append_line(path: impl AsRef<Path>, line: &[u8]) -> StorageResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut record = Vec::with_capacity(line.len() + 1);
    record.extend_from_slice(line);
    record.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&record)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().expect("Failed to initialize test storage");
        (temp, storage)
    }

    #[test]
    fn initialize_creates_directories() {
        let (_temp, storage) = test_storage();
        assert!(storage.paths().keys_dir().is_dir());
        assert!(storage.paths().logs_dir().is_dir());
    }

    #[test]
    fn write_new_and_read_raw() {
        let (_temp, storage) = test_storage();
        let data = b"raw bytes: \x00\x01\x02";
        let path = storage.paths().user_key("u1");

        storage.write_new(&path, data).unwrap();
        assert!(storage.exists(&path));
        assert_eq!(storage.read_raw(&path).unwrap(), data);
    }

    #[test]
    fn write_new_refuses_to_overwrite() {
        let (_temp, storage) = test_storage();
        let path = storage.paths().user_key("u1");

        storage.write_new(&path, b"first").unwrap();
        let result = storage.write_new(&path, b"second");

        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(storage.read_raw(&path).unwrap(), b"first");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_temp, storage) = test_storage();
        let result = storage.read_raw(storage.paths().user_key("nobody"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn health_check_works() {
        let (_temp, storage) = test_storage();
        storage.health_check().expect("Health check should pass");
    }

    #[test]
    fn uninitialized_storage_returns_error() {
        let storage = FileStorage::new(StoragePaths::new("/tmp/never-init"));
        let result = storage.read_raw("/tmp/any.key");
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }

    #[test]
    fn append_line_accumulates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("log.jsonl");

        append_line(&path, b"one").unwrap();
        append_line(&path, b"two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
