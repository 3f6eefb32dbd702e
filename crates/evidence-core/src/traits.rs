//! The storage seam of the evidence store.
//!
//! `EvidenceStore` owns the chain logic (hashing, linkage, serialization of
//! writes); a `StorageBackend` only moves bytes.  Backends hold two things:
//!
//! - **records**: serialized records keyed by their hash, create-only
//! - **the pointer log**: the ordered, append-only list of published hashes
//!
//! A record is *published* once its hash is in the pointer log.  Only the
//! store decides when that happens.

use std::sync::Arc;

use evidence_contracts::EvidenceResult;

/// Durable storage for serialized records and the pointer log.
///
/// Implementations must be safe to call from many threads at once.  The
/// store serializes writers itself, so `put_record`, `discard_record` and
/// `append_pointer` are never called concurrently with each other; readers
/// (`get_record`, `pointer_log`) may run at any time and must only ever
/// observe fully written records and complete pointer entries.
pub trait StorageBackend: Send + Sync {
    /// Persist `bytes` under `hash`.
    ///
    /// Create-only: if a record already exists under `hash` the call must
    /// fail with `StorageIo` and leave the existing record untouched.
    fn put_record(&self, hash: &str, bytes: &[u8]) -> EvidenceResult<()>;

    /// Load the bytes stored under `hash`, or `NotFound`.
    fn get_record(&self, hash: &str) -> EvidenceResult<Vec<u8>>;

    /// Remove a record that was stored but never published.
    ///
    /// Only used to roll back a write whose pointer append failed.
    fn discard_record(&self, hash: &str) -> EvidenceResult<()>;

    /// Durably append `hash` to the end of the pointer log.
    fn append_pointer(&self, hash: &str) -> EvidenceResult<()>;

    /// Every published hash, in append order.
    fn pointer_log(&self) -> EvidenceResult<Vec<String>>;

    /// The key of every stored record, published or not, in no particular
    /// order.  Used by crash recovery to find unpublished records.
    fn record_hashes(&self) -> EvidenceResult<Vec<String>>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn put_record(&self, hash: &str, bytes: &[u8]) -> EvidenceResult<()> {
        (**self).put_record(hash, bytes)
    }

    fn get_record(&self, hash: &str) -> EvidenceResult<Vec<u8>> {
        (**self).get_record(hash)
    }

    fn discard_record(&self, hash: &str) -> EvidenceResult<()> {
        (**self).discard_record(hash)
    }

    fn append_pointer(&self, hash: &str) -> EvidenceResult<()> {
        (**self).append_pointer(hash)
    }

    fn pointer_log(&self) -> EvidenceResult<Vec<String>> {
        (**self).pointer_log()
    }

    fn record_hashes(&self) -> EvidenceResult<Vec<String>> {
        (**self).record_hashes()
    }
}
