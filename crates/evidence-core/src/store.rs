//! The evidence store: append-only, hash-chained, write-once storage.
//!
//! Each `write` seals a payload into a `Record` whose hash commits to the
//! previous record's hash, persists it, then publishes it by appending the
//! hash to the backend's pointer log.  The chain head lives in the store
//! instance behind a mutex, so concurrent writers always extend one linear
//! chain.
//!
//! Write ordering is record first, pointer second.  A failed pointer append
//! discards the unpublished record.  A crash between the two steps leaves an
//! *orphan* (a stored record the pointer log does not mention); `open` adopts
//! any orphan that extends the current head, so the chain heals itself on
//! restart.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use evidence_contracts::{
    ChainSummary, EvidenceError, EvidenceResult, Metadata, Record, WriteReceipt,
};

use crate::{
    chain::{check_link, content_matches, hash_fields, is_valid_hash},
    traits::StorageBackend,
    walk::ChainWalk,
};

/// Options applied when a store is opened.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Walk and verify the whole chain after recovery; a violation fails
    /// the open.
    pub verify_on_open: bool,
}

/// An append-only, tamper-evident evidence store over a pluggable backend.
///
/// # Thread safety
///
/// `write` holds an internal mutex for the whole read-head → hash → persist
/// → publish sequence.  `read`, `verify` and `export` never take it; they
/// only see records that are already committed to the backend.
pub struct EvidenceStore {
    backend: Box<dyn StorageBackend>,
    /// Hash of the last published record, or `None` for an empty chain.
    head: Mutex<Option<String>>,
}

impl EvidenceStore {
    /// Open a store over `backend` with default options.
    pub fn open(backend: Box<dyn StorageBackend>) -> EvidenceResult<Self> {
        Self::open_with(backend, StoreOptions::default())
    }

    /// Open a store, run crash recovery, and seed the chain head from the
    /// pointer log.
    pub fn open_with(
        backend: Box<dyn StorageBackend>,
        options: StoreOptions,
    ) -> EvidenceResult<Self> {
        let head = recover(backend.as_ref())?;

        let store = Self {
            backend,
            head: Mutex::new(head),
        };

        if options.verify_on_open {
            let summary = store.verify_chain()?;
            info!(length = summary.length, "evidence chain verified on open");
        }

        Ok(store)
    }

    /// Seal `data` and `metadata` into a new record and append it to the
    /// chain.
    ///
    /// Non-finite floats (`NaN`, `±inf`) have no JSON form and are stored as
    /// `null`, the same as any JSON encoder would write them.
    ///
    /// # Errors
    ///
    /// - `Serialization` if `data` cannot be represented as JSON (e.g. a map
    ///   with non-string keys)
    /// - `StorageIo` if the record or its pointer cannot be persisted.  The
    ///   record is not published unless the pointer reached the log before
    ///   the failure; either way the chain head afterwards matches the tail
    ///   of the pointer log.
    pub fn write<T>(&self, data: &T, metadata: Metadata) -> EvidenceResult<WriteReceipt>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_value(data)?;

        let mut head = self.head.lock().map_err(|e| EvidenceError::StorageIo {
            reason: format!("chain head lock poisoned: {}", e),
        })?;

        let timestamp: DateTime<Utc> = Utc::now().trunc_subsecs(3);
        let previous_hash = head.clone();
        let hash = hash_fields(&timestamp, &metadata, &data, previous_hash.as_deref())?;

        let record = Record {
            timestamp,
            metadata,
            data,
            previous_hash,
            hash: hash.clone(),
        };
        let bytes = serde_json::to_vec(&record)?;

        self.backend.put_record(&hash, &bytes)?;

        if let Err(err) = self.backend.append_pointer(&hash) {
            self.settle_failed_append(&mut head, &hash, &err);
            return Err(err);
        }

        *head = Some(hash.clone());

        info!(
            hash = %hash,
            previous_hash = ?record.previous_hash,
            kind = record.metadata.kind().unwrap_or("-"),
            "evidence record committed"
        );

        Ok(WriteReceipt { hash, timestamp })
    }

    /// Undo what a failed `append_pointer` left behind and bring `head` back
    /// in line with the durable pointer log.
    ///
    /// An append can fail after its line is already in the log (e.g. the
    /// sync fails and the truncate does too).  That record is published, the
    /// backend refuses to discard it, and the next write must link to it.
    fn settle_failed_append(&self, head: &mut Option<String>, hash: &str, err: &EvidenceError) {
        match self.backend.discard_record(hash) {
            Ok(()) => warn!(
                hash = %hash,
                error = %err,
                "pointer append failed; unpublished record discarded"
            ),
            Err(discard_err) => warn!(
                hash = %hash,
                error = %err,
                discard_error = %discard_err,
                "pointer append failed and record could not be discarded"
            ),
        }

        match self.backend.pointer_log() {
            Ok(log) => {
                let tail = log.last().cloned();
                if tail != *head {
                    warn!(
                        previous_head = ?head,
                        head = ?tail,
                        "chain head resynchronized with pointer log after failed append"
                    );
                    *head = tail;
                }
            }
            Err(e) => warn!(
                error = %e,
                "pointer log unreadable after failed append; chain head unchanged"
            ),
        }
    }

    /// Load the record stored under `hash`.
    ///
    /// Returns `NotFound` for unknown hashes and for strings that are not
    /// 64 lowercase hex digits.
    pub fn read(&self, hash: &str) -> EvidenceResult<Record> {
        debug!(hash = %hash, "reading evidence record");
        load_record(self.backend.as_ref(), hash)
    }

    /// True iff the record under `hash` exists and its content still hashes
    /// to `hash`.
    ///
    /// Never fails: missing, unreadable and malformed records all yield
    /// `false`.  Has no side effects.
    pub fn verify(&self, hash: &str) -> bool {
        let record = match self.read(hash) {
            Ok(record) => record,
            Err(e) => {
                debug!(hash = %hash, error = %e, "verify could not load record");
                return false;
            }
        };

        let intact = record.hash == hash && content_matches(&record);
        if !intact {
            warn!(hash = %hash, "evidence record failed content verification");
        }
        intact
    }

    /// Walk the chain in append order, yielding records whose timestamp lies
    /// in the inclusive range `[start, end]`.  Either bound may be omitted.
    ///
    /// The pointer log is read once when the walk is created; records are
    /// loaded lazily as the walk advances.  Calling `export` again starts a
    /// fresh walk.
    pub fn export(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> EvidenceResult<ChainWalk<'_>> {
        let hashes = self.backend.pointer_log()?;
        debug!(length = hashes.len(), ?start, ?end, "starting chain walk");
        Ok(ChainWalk::new(self.backend.as_ref(), hashes, start, end))
    }

    /// Verify the whole chain: every record's content hash and every
    /// `previousHash` link, from genesis to head.
    ///
    /// # Errors
    ///
    /// `ChainIntegrityViolation` naming the first bad position, or the
    /// storage error that prevented the walk.
    pub fn verify_chain(&self) -> EvidenceResult<ChainSummary> {
        let mut expected_prev: Option<String> = None;
        let mut length = 0;

        for (position, item) in self.export(None, None)?.enumerate() {
            let record = item?;
            if let Some(reason) = check_link(&record, expected_prev.as_deref()) {
                warn!(position, hash = %record.hash, reason = %reason, "chain integrity violation");
                return Err(EvidenceError::ChainIntegrityViolation { position, reason });
            }
            expected_prev = Some(record.hash);
            length += 1;
        }

        Ok(ChainSummary {
            length,
            head: expected_prev,
        })
    }

    /// Hash of the most recently published record.
    pub fn head(&self) -> Option<String> {
        match self.head.lock() {
            Ok(head) => head.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of published records.
    pub fn len(&self) -> EvidenceResult<usize> {
        Ok(self.backend.pointer_log()?.len())
    }

    pub fn is_empty(&self) -> EvidenceResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Load and deserialize one record.
pub(crate) fn load_record(backend: &dyn StorageBackend, hash: &str) -> EvidenceResult<Record> {
    if !is_valid_hash(hash) {
        return Err(EvidenceError::NotFound {
            hash: hash.to_string(),
        });
    }
    let bytes = backend.get_record(hash)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Rebuild the chain head from the pointer log and adopt orphans.
///
/// 1. The last pointer must resolve to a stored record.
/// 2. Stored records missing from the pointer log are orphans.
/// 3. An orphan whose content is intact and whose `previousHash` is the
///    current head is appended to the pointer log and becomes the new head;
///    repeat until no orphan extends the head.
/// 4. Whatever is left is logged and left in place.
fn recover(backend: &dyn StorageBackend) -> EvidenceResult<Option<String>> {
    let log = backend.pointer_log()?;
    let mut head = log.last().cloned();

    if let Some(last) = &head {
        match backend.get_record(last) {
            Ok(_) => {}
            Err(EvidenceError::NotFound { .. }) => {
                return Err(EvidenceError::ChainIntegrityViolation {
                    position: log.len() - 1,
                    reason: format!("chain head {} has no stored record", last),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let mut position = log.len();
    let published: HashSet<String> = log.into_iter().collect();

    let mut orphans = Vec::new();
    for hash in backend.record_hashes()? {
        if published.contains(&hash) {
            continue;
        }
        match load_record(backend, &hash) {
            Ok(record) if record.hash == hash && content_matches(&record) => orphans.push(record),
            Ok(_) => warn!(hash = %hash, "orphaned record fails content verification; ignored"),
            Err(e) => warn!(hash = %hash, error = %e, "orphaned record unreadable; ignored"),
        }
    }

    if orphans.is_empty() {
        return Ok(head);
    }

    while let Some(idx) = orphans.iter().position(|r| r.previous_hash == head) {
        let record = orphans.swap_remove(idx);
        backend.append_pointer(&record.hash)?;
        info!(hash = %record.hash, position, "adopted orphaned record into chain");
        head = Some(record.hash);
        position += 1;
    }

    for record in &orphans {
        warn!(
            hash = %record.hash,
            previous_hash = ?record.previous_hash,
            "orphaned record does not extend the chain; left in place"
        );
    }

    Ok(head)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};
    use std::thread;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::chain::verify_chain;

    // ── Mock backends ─────────────────────────────────────────────────────────

    /// A backend that keeps everything in maps and can be told to fail
    /// pointer appends.
    #[derive(Default)]
    struct MockBackend {
        records: RwLock<HashMap<String, Vec<u8>>>,
        pointers: RwLock<Vec<String>>,
        fail_appends: RwLock<bool>,
        /// Record the pointer, then report failure anyway.
        fail_after_append: RwLock<bool>,
    }

    impl MockBackend {
        fn failing_appends() -> Self {
            let backend = Self::default();
            *backend.fail_appends.write().unwrap() = true;
            backend
        }

        fn overwrite(&self, hash: &str, record: &Record) {
            self.records
                .write()
                .unwrap()
                .insert(hash.to_string(), serde_json::to_vec(record).unwrap());
        }

        fn drop_pointer(&self, hash: &str) {
            self.pointers.write().unwrap().retain(|h| h != hash);
        }
    }

    impl StorageBackend for MockBackend {
        fn put_record(&self, hash: &str, bytes: &[u8]) -> EvidenceResult<()> {
            let mut records = self.records.write().unwrap();
            if records.contains_key(hash) {
                return Err(EvidenceError::StorageIo {
                    reason: format!("record {} already exists", hash),
                });
            }
            records.insert(hash.to_string(), bytes.to_vec());
            Ok(())
        }

        fn get_record(&self, hash: &str) -> EvidenceResult<Vec<u8>> {
            self.records
                .read()
                .unwrap()
                .get(hash)
                .cloned()
                .ok_or_else(|| EvidenceError::NotFound {
                    hash: hash.to_string(),
                })
        }

        fn discard_record(&self, hash: &str) -> EvidenceResult<()> {
            if self.pointers.read().unwrap().iter().any(|h| h == hash) {
                return Err(EvidenceError::StorageIo {
                    reason: format!("record {} is published", hash),
                });
            }
            self.records.write().unwrap().remove(hash);
            Ok(())
        }

        fn append_pointer(&self, hash: &str) -> EvidenceResult<()> {
            if *self.fail_appends.read().unwrap() {
                return Err(EvidenceError::StorageIo {
                    reason: "pointer log unavailable".to_string(),
                });
            }
            self.pointers.write().unwrap().push(hash.to_string());
            if *self.fail_after_append.read().unwrap() {
                return Err(EvidenceError::StorageIo {
                    reason: "fsync failed".to_string(),
                });
            }
            Ok(())
        }

        fn pointer_log(&self) -> EvidenceResult<Vec<String>> {
            Ok(self.pointers.read().unwrap().clone())
        }

        fn record_hashes(&self) -> EvidenceResult<Vec<String>> {
            Ok(self.records.read().unwrap().keys().cloned().collect())
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn store_over(backend: &Arc<MockBackend>) -> EvidenceStore {
        EvidenceStore::open(Box::new(Arc::clone(backend))).unwrap()
    }

    fn audit_meta(user: &str) -> Metadata {
        Metadata::new()
            .with("type", "audit_export")
            .with("user", user)
    }

    // ── Write / read / verify ─────────────────────────────────────────────────

    #[test]
    fn test_write_then_verify() {
        let store = store_over(&Arc::new(MockBackend::default()));
        let receipt = store
            .write(&json!({ "logs": [{ "action": "login" }] }), audit_meta("admin1"))
            .unwrap();

        assert!(store.verify(&receipt.hash));
        let record = store.read(&receipt.hash).unwrap();
        assert_eq!(record.hash, receipt.hash);
        assert_eq!(record.timestamp, receipt.timestamp);
        assert!(record.is_genesis());
        assert_eq!(store.head(), Some(receipt.hash));
    }

    #[test]
    fn test_chain_linkage() {
        let store = store_over(&Arc::new(MockBackend::default()));
        let h1 = store.write(&json!({ "logs": [] }), audit_meta("admin1")).unwrap();
        let h2 = store
            .write(
                &json!({ "wallets": [] }),
                Metadata::new().with("type", "financial_export"),
            )
            .unwrap();

        let second = store.read(&h2.hash).unwrap();
        assert_eq!(second.previous_hash.as_deref(), Some(h1.hash.as_str()));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_empty_metadata_is_accepted() {
        let store = store_over(&Arc::new(MockBackend::default()));
        let receipt = store.write(&42, Metadata::new()).unwrap();
        assert!(store.verify(&receipt.hash));
        assert!(store.read(&receipt.hash).unwrap().metadata.is_empty());
    }

    #[test]
    fn test_unknown_hash() {
        let store = store_over(&Arc::new(MockBackend::default()));
        assert!(!store.verify("not-a-real-hash"));
        assert!(matches!(
            store.read("not-a-real-hash"),
            Err(EvidenceError::NotFound { .. })
        ));

        let absent = "ab".repeat(32);
        assert!(!store.verify(&absent));
        assert!(matches!(
            store.read(&absent),
            Err(EvidenceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_tamper_detection() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let h1 = store.write(&json!({ "logs": [1, 2] }), audit_meta("admin1")).unwrap();
        let h2 = store.write(&json!({ "wallets": [] }), Metadata::new()).unwrap();

        let mut record = store.read(&h1.hash).unwrap();
        record.data = json!({ "logs": [1, 2, 3] });
        backend.overwrite(&h1.hash, &record);

        assert!(!store.verify(&h1.hash));
        assert!(store.verify(&h2.hash), "per-record check is independent");

        match store.verify_chain() {
            Err(EvidenceError::ChainIntegrityViolation { position, .. }) => assert_eq!(position, 0),
            other => panic!("expected ChainIntegrityViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_tamper_detection() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let receipt = store.write(&json!([]), audit_meta("admin1")).unwrap();

        let mut record = store.read(&receipt.hash).unwrap();
        record.metadata.insert("user", "mallory");
        backend.overwrite(&receipt.hash, &record);

        assert!(!store.verify(&receipt.hash));
    }

    #[test]
    fn test_unparseable_record_verifies_false() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let receipt = store.write(&json!({}), Metadata::new()).unwrap();

        backend
            .records
            .write()
            .unwrap()
            .insert(receipt.hash.clone(), b"{ truncated".to_vec());

        assert!(!store.verify(&receipt.hash));
        assert!(matches!(
            store.read(&receipt.hash),
            Err(EvidenceError::Serialization { .. })
        ));
    }

    #[test]
    fn test_verify_is_idempotent() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let receipt = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();
        let before = backend.get_record(&receipt.hash).unwrap();

        for _ in 0..5 {
            assert!(store.verify(&receipt.hash));
        }

        assert_eq!(backend.get_record(&receipt.hash).unwrap(), before);
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.head(), Some(receipt.hash));
    }

    // ── Failure atomicity ─────────────────────────────────────────────────────

    #[test]
    fn test_failed_pointer_append_rolls_back() {
        let backend = Arc::new(MockBackend::failing_appends());
        let store = store_over(&backend);

        let result = store.write(&json!({ "n": 1 }), Metadata::new());
        assert!(matches!(result, Err(EvidenceError::StorageIo { .. })));

        assert_eq!(store.head(), None);
        assert!(backend.record_hashes().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    /// The pointer lands in the log but the append still reports an error.
    /// The record is published, so the next write must link to it.
    #[test]
    fn test_append_error_after_pointer_landed_keeps_chain_linear() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let h1 = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap().hash;

        *backend.fail_after_append.write().unwrap() = true;
        let result = store.write(&json!({ "n": 2 }), Metadata::new());
        assert!(matches!(result, Err(EvidenceError::StorageIo { .. })));
        *backend.fail_after_append.write().unwrap() = false;

        let log = backend.pointer_log().unwrap();
        assert_eq!(log.len(), 2);
        let h2 = log[1].clone();
        assert_eq!(store.head(), Some(h2.clone()));
        assert_eq!(store.read(&h2).unwrap().previous_hash, Some(h1));

        let h3 = store.write(&json!({ "n": 3 }), Metadata::new()).unwrap().hash;
        assert_eq!(store.read(&h3).unwrap().previous_hash, Some(h2));
        assert_eq!(store.verify_chain().unwrap().length, 3);
    }

    #[test]
    fn test_unserializable_payload_is_rejected() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);

        let mut grid: HashMap<(i32, i32), i32> = HashMap::new();
        grid.insert((0, 1), 7);

        let result = store.write(&grid, Metadata::new());
        assert!(matches!(result, Err(EvidenceError::Serialization { .. })));
        assert_eq!(store.head(), None);
        assert_eq!(store.len().unwrap(), 0);
        assert!(backend.record_hashes().unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_floats_are_stored_as_null() {
        let store = store_over(&Arc::new(MockBackend::default()));
        let receipt = store.write(&f64::NAN, Metadata::new()).unwrap();

        assert_eq!(store.read(&receipt.hash).unwrap().data, serde_json::Value::Null);
        assert!(store.verify(&receipt.hash));
    }

    // ── Recovery ──────────────────────────────────────────────────────────────

    #[test]
    fn test_recovery_adopts_orphan_extending_head() {
        let backend = Arc::new(MockBackend::default());
        let (h1, h2) = {
            let store = store_over(&backend);
            let h1 = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();
            let h2 = store.write(&json!({ "n": 2 }), Metadata::new()).unwrap();
            (h1.hash, h2.hash)
        };

        // Simulate a crash after the record was stored but before its
        // pointer was appended.
        backend.drop_pointer(&h2);
        assert_eq!(backend.pointer_log().unwrap(), vec![h1.clone()]);

        let store = store_over(&backend);
        assert_eq!(store.head(), Some(h2.clone()));
        assert_eq!(backend.pointer_log().unwrap(), vec![h1, h2]);
        assert_eq!(store.verify_chain().unwrap().length, 2);
    }

    #[test]
    fn test_recovery_ignores_orphan_off_the_head() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let h1 = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();

        // A sealed record claiming some unrelated predecessor.
        let timestamp = Utc::now().trunc_subsecs(3);
        let stray_prev = "cd".repeat(32);
        let data = json!({ "stray": true });
        let hash = hash_fields(&timestamp, &Metadata::new(), &data, Some(&stray_prev)).unwrap();
        backend.overwrite(
            &hash,
            &Record {
                timestamp,
                metadata: Metadata::new(),
                data,
                previous_hash: Some(stray_prev),
                hash: hash.clone(),
            },
        );
        drop(store);

        let store = store_over(&backend);
        assert_eq!(store.head(), Some(h1.hash));
        assert_eq!(store.len().unwrap(), 1);
        assert!(backend.get_record(&hash).is_ok(), "orphans are never deleted");
    }

    #[test]
    fn test_missing_head_record_fails_open() {
        let backend = Arc::new(MockBackend::default());
        backend.pointers.write().unwrap().push("ef".repeat(32));

        match EvidenceStore::open(Box::new(Arc::clone(&backend))) {
            Err(EvidenceError::ChainIntegrityViolation { position, .. }) => assert_eq!(position, 0),
            Err(other) => panic!("expected ChainIntegrityViolation, got {:?}", other),
            Ok(_) => panic!("open must fail when the head record is missing"),
        }
    }

    #[test]
    fn test_verify_on_open_rejects_tampered_chain() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let receipt = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();
        store.write(&json!({ "n": 2 }), Metadata::new()).unwrap();

        let mut record = store.read(&receipt.hash).unwrap();
        record.data = json!({ "n": 100 });
        backend.overwrite(&receipt.hash, &record);
        drop(store);

        let result = EvidenceStore::open_with(
            Box::new(Arc::clone(&backend)),
            StoreOptions { verify_on_open: true },
        );
        assert!(matches!(
            result,
            Err(EvidenceError::ChainIntegrityViolation { position: 0, .. })
        ));
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    #[test]
    fn test_concurrent_writers_form_one_chain() {
        const WRITERS: usize = 16;
        const PER_WRITER: usize = 8;

        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);

        thread::scope(|scope| {
            for writer in 0..WRITERS {
                let store = &store;
                scope.spawn(move || {
                    for n in 0..PER_WRITER {
                        store
                            .write(
                                &json!({ "writer": writer, "n": n }),
                                Metadata::new().with("type", "audit_export"),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let total = WRITERS * PER_WRITER;
        let summary = store.verify_chain().unwrap();
        assert_eq!(summary.length, total);
        assert_eq!(summary.head, store.head());

        let records: Vec<Record> = store
            .export(None, None)
            .unwrap()
            .collect::<EvidenceResult<_>>()
            .unwrap();
        assert_eq!(records.len(), total);

        let predecessors: HashSet<Option<String>> =
            records.iter().map(|r| r.previous_hash.clone()).collect();
        assert_eq!(predecessors.len(), total, "no two records share a predecessor");
        assert_eq!(records.iter().filter(|r| r.is_genesis()).count(), 1);
        assert!(verify_chain(&records));
    }

    // ── Chain walk ────────────────────────────────────────────────────────────

    #[test]
    fn test_export_time_range() {
        let store = store_over(&Arc::new(MockBackend::default()));

        let r1 = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();
        thread::sleep(Duration::from_millis(5));
        let r2 = store.write(&json!({ "n": 2 }), Metadata::new()).unwrap();
        thread::sleep(Duration::from_millis(5));
        let r3 = store.write(&json!({ "n": 3 }), Metadata::new()).unwrap();

        let all: Vec<String> = store
            .export(Some(r1.timestamp), Some(r3.timestamp))
            .unwrap()
            .map(|r| r.unwrap().hash)
            .collect();
        assert_eq!(all, vec![r1.hash.clone(), r2.hash.clone(), r3.hash.clone()]);

        let after_second = r2.timestamp + chrono::Duration::milliseconds(1);
        let last: Vec<String> = store
            .export(Some(after_second), Some(r3.timestamp))
            .unwrap()
            .map(|r| r.unwrap().hash)
            .collect();
        assert_eq!(last, vec![r3.hash.clone()]);

        let unbounded = store.export(None, None).unwrap().count();
        assert_eq!(unbounded, 3);

        let up_to_first: Vec<String> = store
            .export(None, Some(r1.timestamp))
            .unwrap()
            .map(|r| r.unwrap().hash)
            .collect();
        assert_eq!(up_to_first, vec![r1.hash]);
    }

    #[test]
    fn test_export_reports_missing_record() {
        let backend = Arc::new(MockBackend::default());
        let store = store_over(&backend);
        let r1 = store.write(&json!({ "n": 1 }), Metadata::new()).unwrap();
        store.write(&json!({ "n": 2 }), Metadata::new()).unwrap();

        backend.records.write().unwrap().remove(&r1.hash);

        let mut walk = store.export(None, None).unwrap();
        assert!(matches!(
            walk.next(),
            Some(Err(EvidenceError::ChainIntegrityViolation { position: 0, .. }))
        ));
        assert!(store.verify_chain().is_err());
    }

    #[test]
    fn test_empty_chain() {
        let store = store_over(&Arc::new(MockBackend::default()));
        let summary = store.verify_chain().unwrap();
        assert_eq!(summary.length, 0);
        assert_eq!(summary.head, None);
        assert_eq!(store.export(None, None).unwrap().count(), 0);
    }
}
