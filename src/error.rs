//! Error types for the storage layer.

use thiserror::Error;

/// Errors surfaced by record stores and the collection accessor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Record '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Record version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("MVP not found: {0}")]
    MvpNotFound(String),

    #[error("Idea {0} has already been moved to a story")]
    IdeaAlreadyPromoted(String),

    #[error("Schema step {version} ({name}) failed: {source}")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid record key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
