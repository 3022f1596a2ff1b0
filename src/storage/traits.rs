//! Storage traits and error types
//!
//! This module defines the key-value interface the quota ledger writes to,
//! and the associated error type.

use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Options for [`KvStore::put`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Absolute expiry (Unix seconds); the entry disappears afterwards
    pub expiration_epoch_seconds: Option<i64>,
}

impl PutOptions {
    pub fn expires_at(epoch_seconds: i64) -> Self {
        Self {
            expiration_epoch_seconds: Some(epoch_seconds),
        }
    }
}

/// Trait for key-value store backends
///
/// Entries past their expiration must never be returned by `get`.
/// Implementations are shared between concurrent scrapes, so every method
/// takes `&self`.
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, if present and not expired
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &str, options: PutOptions) -> StorageResult<()>;

    /// Removes `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> StorageResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str, options: PutOptions) -> StorageResult<()> {
        (**self).put(key, value, options)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str, options: PutOptions) -> StorageResult<()> {
        (**self).put(key, value, options)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}
