//! Raw record storage: serialized blobs addressed by a string key.
//!
//! A [`RecordStore`] knows nothing about stories or MVPs. It holds opaque
//! strings and overwrites them wholesale; the last write wins. The typed layer
//! on top lives in [`crate::db`].
//!
//! Backends:
//! - [`MemoryStore`]: process-local map, used for tests and `--backend memory`.
//! - [`FileStore`]: one JSON file per key inside a data directory.
//! - [`SqliteStore`]: a `records` key-value table in a SQLite database.

pub mod document;
mod file;
mod schema;
mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// Key-value persistence for whole serialized records.
///
/// Implementations must be safe to share between threads; each call is
/// atomic with respect to other calls on the same store, but there is no
/// transaction spanning a `get` followed by a `set`.
pub trait RecordStore: Send + Sync {
    /// Read the record stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the record stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the record stored under `key`. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// In-memory store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let records = self.records.lock().expect("record store lock poisoned");
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.lock().expect("record store lock poisoned");
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut records = self.records.lock().expect("record store lock poisoned");
        records.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
