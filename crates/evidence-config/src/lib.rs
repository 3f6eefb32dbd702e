//! # evidence-config
//!
//! TOML-driven configuration for opening an evidence store.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use evidence_config::StoreConfig;
//!
//! let store = StoreConfig::from_file(Path::new("evidence.toml"))?
//!     .apply_env()
//!     .open_store()?;
//! ```

pub mod config;
pub mod loader;

pub use config::{BackendKind, StoreConfig, DEFAULT_STORE_DIR};
pub use loader::STORE_DIR_ENV;

// ── Tests ─────────────────────────────────────────────────────────────────────
