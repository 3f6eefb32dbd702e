//! Evidence records and the values returned by store operations.
//!
//! A `Record` is the immutable unit of evidence.  It is written once, keyed
//! by its own `hash`, and linked to its predecessor through `previous_hash`.
//! Field names serialize in camelCase so persisted records keep the layout
//! the export routes have always produced.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata key holding the export type tag (e.g. `"audit_export"`).
pub const METADATA_TYPE_KEY: &str = "type";

/// Metadata key holding the id of the actor who requested the export.
pub const METADATA_USER_KEY: &str = "user";

/// Metadata key holding the query parameters the export was built from.
pub const METADATA_QUERY_KEY: &str = "query";

/// Caller-supplied provenance for a record.
///
/// The store treats metadata as opaque: it is hashed and persisted but never
/// interpreted.  Keys are kept in a `BTreeMap` so iteration order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// An empty metadata mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The export type tag stored under `"type"`, if it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.get(METADATA_TYPE_KEY).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for Metadata {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// An immutable, hash-addressed unit of evidence.
///
/// `hash` is the lowercase hex SHA-256 of the canonical serialization of the
/// other four fields.  It is computed once at write time and doubles as the
/// record's storage key.  Altering any other field (including anything
/// nested inside `data` or `metadata`) makes the stored `hash` stale, which
/// `EvidenceStore::verify` detects.  Fields outside the hashed set are
/// rejected on load, so nothing can be smuggled in alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Record {
    /// Creation instant (UTC, millisecond precision), assigned by the store.
    pub timestamp: DateTime<Utc>,

    /// Caller-supplied provenance.
    pub metadata: Metadata,

    /// Caller-supplied payload.
    pub data: Value,

    /// Hash of the record that was the chain head when this one was written,
    /// or `None` for the first record of a chain.
    pub previous_hash: Option<String>,

    /// Content hash and identity of this record.
    pub hash: String,
}

impl Record {
    /// True if this record starts a chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_none()
    }
}

/// What a successful `write` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    /// Hash (and storage key) of the new record.
    pub hash: String,
    /// The timestamp sealed into the record.
    pub timestamp: DateTime<Utc>,
}

/// Result of a full chain walk that found no integrity violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Number of records reachable from the pointer log.
    pub length: usize,
    /// Hash of the last record, or `None` for an empty chain.
    pub head: Option<String>,
}
