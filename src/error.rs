//! Error Types
//!
//! Lookups that find nothing return `None`; only storage collaborator
//! failures are errors. A failed store call aborts the operation before
//! any in-memory state is touched.

use thiserror::Error;

/// Failure reported by a storage collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not be reached or refused the call.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
