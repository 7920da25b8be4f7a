//! Error types for metadata store operations.

use dfab_types::DocumentId;
use thiserror::Error;

/// Errors that can occur during metadata store operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// A record with this id already exists.
    #[error("record already exists: {id}")]
    AlreadyExists { id: DocumentId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored record could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    /// Database failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding store state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Convenience type alias for metadata store operations.
pub type Result<T> = std::result::Result<T, MetaError>;

/// Crate-qualified name for [`Result`], for use outside this crate.
pub type MetaResult<T> = Result<T>;
