//! In-memory implementation of `StorageBackend`.
//!
//! `InMemoryBackend` keeps serialized records in a `HashMap` and the pointer
//! log in a `Vec`, each behind its own `RwLock`.  Nothing survives the
//! process; use it for tests and for ephemeral stores.

use std::collections::HashMap;
use std::sync::RwLock;

use evidence_contracts::{EvidenceError, EvidenceResult};
use evidence_core::traits::StorageBackend;

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    pub(crate) records: RwLock<HashMap<String, Vec<u8>>>,
    pub(crate) pointers: RwLock<Vec<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> EvidenceError {
    EvidenceError::StorageIo {
        reason: format!("in-memory {} lock poisoned", what),
    }
}

impl StorageBackend for InMemoryBackend {
    fn put_record(&self, hash: &str, bytes: &[u8]) -> EvidenceResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned("record"))?;
        if records.contains_key(hash) {
            return Err(EvidenceError::StorageIo {
                reason: format!("record {} already exists", hash),
            });
        }
        records.insert(hash.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get_record(&self, hash: &str) -> EvidenceResult<Vec<u8>> {
        let records = self.records.read().map_err(|_| poisoned("record"))?;
        records
            .get(hash)
            .cloned()
            .ok_or_else(|| EvidenceError::NotFound {
                hash: hash.to_string(),
            })
    }

    fn discard_record(&self, hash: &str) -> EvidenceResult<()> {
        let pointers = self.pointers.read().map_err(|_| poisoned("pointer"))?;
        if pointers.iter().any(|h| h == hash) {
            return Err(EvidenceError::StorageIo {
                reason: format!("record {} is published and cannot be discarded", hash),
            });
        }
        drop(pointers);

        self.records
            .write()
            .map_err(|_| poisoned("record"))?
            .remove(hash);
        Ok(())
    }

    fn append_pointer(&self, hash: &str) -> EvidenceResult<()> {
        self.pointers
            .write()
            .map_err(|_| poisoned("pointer"))?
            .push(hash.to_string());
        Ok(())
    }

    fn pointer_log(&self) -> EvidenceResult<Vec<String>> {
        Ok(self.pointers.read().map_err(|_| poisoned("pointer"))?.clone())
    }

    fn record_hashes(&self) -> EvidenceResult<Vec<String>> {
        Ok(self
            .records
            .read()
            .map_err(|_| poisoned("record"))?
            .keys()
            .cloned()
            .collect())
    }
}
