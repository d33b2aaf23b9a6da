//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A message was appended at a sequence number that does not match
    /// the next position in the room's log. This only happens if a writer
    /// bypassed the room's lock.
    #[error("sequence conflict: expected {expected}, got {got}")]
    SeqConflict {
        /// Expected sequence number (current log length).
        expected: u64,
        /// Sequence number that was provided.
        got: u64,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying backend.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
