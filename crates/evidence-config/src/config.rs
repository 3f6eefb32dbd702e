//! Store configuration schema.
//!
//! A `StoreConfig` is deserialized from TOML.  Every field has a default, so
//! an empty document yields a filesystem store under `data/worm`.
//!
//! Example:
//! ```toml
//! backend = "filesystem"
//! dir = "/var/lib/evidence"
//! sync = "every-write"
//! verify_on_open = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use evidence_storage::SyncPolicy;

/// Default store directory, relative to the working directory.
pub const DEFAULT_STORE_DIR: &str = "data/worm";

/// Which `StorageBackend` to build.
///
/// Expressed as a kebab-case string in TOML:
/// ```toml
/// backend = "filesystem"
/// backend = "memory"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Filesystem,
    /// Nothing persists past the process.  Intended for tests and dry runs.
    Memory,
}

/// The top-level structure deserialized from a store configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend to open.
    #[serde(default)]
    pub backend: BackendKind,

    /// Root directory of a filesystem store.  Ignored by the memory backend.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// `fsync` policy for the filesystem backend.
    #[serde(default)]
    pub sync: SyncPolicy,

    /// Verify the whole chain every time the store is opened.
    #[serde(default)]
    pub verify_on_open: bool,
}

fn default_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            dir: default_dir(),
            sync: SyncPolicy::default(),
            verify_on_open: false,
        }
    }
}
