//! # evidence-storage
//!
//! Concrete `StorageBackend` implementations for the evidence store.
//!
//! - [`InMemoryBackend`]: maps behind `RwLock`s; nothing is persisted.
//! - [`FsBackend`]: one JSON file per record plus an append-only
//!   `chain.txt` pointer log, with crash-safe record writes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evidence_core::EvidenceStore;
//! use evidence_storage::{FsBackend, SyncPolicy};
//!
//! let backend = FsBackend::open("data/worm", SyncPolicy::EveryWrite)?;
//! let store = EvidenceStore::open(Box::new(backend))?;
//! ```

pub mod fs;
pub mod memory;

pub use fs::{FsBackend, SyncPolicy};
pub use memory::InMemoryBackend;

// ── Tests ─────────────────────────────────────────────────────────────────────
