//! # evidence-core
//!
//! Append-only, SHA-256 hash-chained evidence store.
//!
//! This crate provides:
//! - the `StorageBackend` trait that concrete backends implement
//! - canonical serialization, hashing and linkage checks (`chain`)
//! - the `EvidenceStore` that seals payloads into records and keeps one
//!   linear chain across concurrent writers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evidence_contracts::Metadata;
//! use evidence_core::EvidenceStore;
//! use evidence_storage::InMemoryBackend;
//!
//! let store = EvidenceStore::open(Box::new(InMemoryBackend::new()))?;
//! let receipt = store.write(&logs, Metadata::new().with("type", "audit_export"))?;
//! assert!(store.verify(&receipt.hash));
//! ```

pub mod chain;
pub mod store;
pub mod traits;
pub mod walk;

pub use chain::{canonical_json, hash_fields, is_valid_hash, verify_chain};
pub use store::{EvidenceStore, StoreOptions};
pub use traits::StorageBackend;
pub use walk::ChainWalk;
