//! Lazy, time-filtered walk over the published chain.

use std::vec::IntoIter;

use chrono::{DateTime, Utc};

use evidence_contracts::{EvidenceError, EvidenceResult, Record};

use crate::{store::load_record, traits::StorageBackend};

/// Iterator over published records in chain order.
///
/// Holds a snapshot of the pointer log taken when the walk was created, and
/// loads each record only when the walk reaches it.  Records outside the
/// `[start, end]` window are skipped.  A pointer whose record is missing, or
/// whose record carries a different hash, yields `ChainIntegrityViolation`.
pub struct ChainWalk<'a> {
    backend: &'a dyn StorageBackend,
    hashes: IntoIter<String>,
    position: usize,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl<'a> ChainWalk<'a> {
    pub(crate) fn new(
        backend: &'a dyn StorageBackend,
        hashes: Vec<String>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            backend,
            hashes: hashes.into_iter(),
            position: 0,
            start,
            end,
        }
    }

    fn in_range(&self, timestamp: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| *timestamp >= start)
            && self.end.map_or(true, |end| *timestamp <= end)
    }

    fn load(&self, position: usize, hash: &str) -> EvidenceResult<Record> {
        let record = match load_record(self.backend, hash) {
            Ok(record) => record,
            Err(EvidenceError::NotFound { .. }) => {
                return Err(EvidenceError::ChainIntegrityViolation {
                    position,
                    reason: format!("pointer {} has no stored record", hash),
                });
            }
            Err(e) => return Err(e),
        };

        if record.hash != hash {
            return Err(EvidenceError::ChainIntegrityViolation {
                position,
                reason: format!("pointer {} resolves to record {}", hash, record.hash),
            });
        }

        Ok(record)
    }
}

impl Iterator for ChainWalk<'_> {
    type Item = EvidenceResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let hash = self.hashes.next()?;
            let position = self.position;
            self.position += 1;

            match self.load(position, &hash) {
                Ok(record) if self.in_range(&record.timestamp) => return Some(Ok(record)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.hashes.len()))
    }
}
