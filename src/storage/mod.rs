//! Storage module for the shared key-value store
//!
//! The scraper keeps no state of its own between calls; the only persistent
//! data are quota records, written through the [`KvStore`] trait. Two
//! backends are provided:
//! - [`MemoryStore`] for tests and one-off CLI runs
//! - [`SqliteStore`] for a durable local store

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{KvStore, PutOptions, StorageError, StorageResult};

use std::path::Path;

/// Opens a SQLite-backed store at `path`, creating it if needed
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}
