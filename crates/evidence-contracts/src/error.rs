//! Error types for the evidence store.
//!
//! Every fallible operation in the workspace returns `EvidenceResult<T>`.
//! Variants carry the hash, position, or reason needed to act on a failure
//! without re-reading the store.

use thiserror::Error;

/// The unified error type for the evidence store and its collaborators.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// No record is stored under the requested hash.
    ///
    /// Malformed hash strings are reported the same way; they can never
    /// address a record.
    #[error("no evidence record found for hash '{hash}'")]
    NotFound { hash: String },

    /// A payload or record could not be serialized, deserialized, or
    /// canonicalized for hashing.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// The storage backend failed to read or write durable state.
    #[error("storage I/O error: {reason}")]
    StorageIo { reason: String },

    /// A full chain walk found a broken link, a content-hash mismatch, or a
    /// pointer-log entry whose record is missing.
    #[error("chain integrity violation at position {position}: {reason}")]
    ChainIntegrityViolation { position: usize, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An issued export failed verification when it was re-checked.
    #[error("invalid or tampered export record '{hash}'")]
    TamperedExport { hash: String },
}

/// Convenience alias used throughout the evidence crates.
pub type EvidenceResult<T> = Result<T, EvidenceError>;

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        EvidenceError::Serialization {
            reason: err.to_string(),
        }
    }
}
