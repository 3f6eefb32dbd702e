//! Loading a `StoreConfig` and opening the store it describes.
//!
//! Sources, in increasing precedence:
//!
//! 1. built-in defaults
//! 2. a TOML document (`from_toml_str` / `from_file`)
//! 3. the `EVIDENCE_STORE_DIR` environment variable (`apply_env`)

use std::path::{Path, PathBuf};

use tracing::debug;

use evidence_contracts::{EvidenceError, EvidenceResult};
use evidence_core::{EvidenceStore, StorageBackend, StoreOptions};
use evidence_storage::{FsBackend, InMemoryBackend};

use crate::config::{BackendKind, StoreConfig};

/// Environment variable that overrides `dir`.
pub const STORE_DIR_ENV: &str = "EVIDENCE_STORE_DIR";

impl StoreConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `EvidenceError::ConfigError` if the TOML is malformed or does
    /// not match the `StoreConfig` schema.
    pub fn from_toml_str(s: &str) -> EvidenceResult<Self> {
        toml::from_str(s).map_err(|e| EvidenceError::ConfigError {
            reason: format!("failed to parse store config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML store configuration.
    pub fn from_file(path: &Path) -> EvidenceResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| EvidenceError::ConfigError {
            reason: format!("failed to read store config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(STORE_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            debug!(dir = %dir, "store directory overridden from environment");
            self.dir = PathBuf::from(dir);
        }
        self
    }

    /// Construct the configured backend.
    pub fn build_backend(&self) -> EvidenceResult<Box<dyn StorageBackend>> {
        match self.backend {
            BackendKind::Filesystem => Ok(Box::new(FsBackend::open(&self.dir, self.sync)?)),
            BackendKind::Memory => Ok(Box::new(InMemoryBackend::new())),
        }
    }

    /// Build the backend and open a store over it, running recovery and,
    /// when configured, a full chain verification.
    pub fn open_store(&self) -> EvidenceResult<EvidenceStore> {
        let backend = self.build_backend()?;
        EvidenceStore::open_with(
            backend,
            StoreOptions {
                verify_on_open: self.verify_on_open,
            },
        )
    }
}
