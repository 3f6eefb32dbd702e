//! Hash-chain primitives: canonical serialization, hashing, and linkage
//! verification.
//!
//! Hash input: the compact JSON encoding of the object
//!
//! ```text
//! {"data": …, "metadata": …, "previousHash": …, "timestamp": …}
//! ```
//!
//! with the keys of every object, at every depth, emitted in ascending byte
//! order and no whitespace.  Strings and numbers are encoded by serde_json's
//! standard writer.  Key order is enforced here rather than left to the map
//! type, so the digest does not depend on how `serde_json` was compiled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use evidence_contracts::{EvidenceResult, Metadata, Record};

/// Length of a lowercase hex SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// The fields a record's hash commits to.  Everything except `hash` itself.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashInput<'a> {
    timestamp: &'a DateTime<Utc>,
    metadata: &'a Metadata,
    data: &'a Value,
    previous_hash: Option<&'a str>,
}

/// True if `hash` has the shape of a digest this store produces: exactly 64
/// lowercase hex characters.
///
/// Anything else can never address a record, and backends rely on this
/// check to keep arbitrary strings out of storage keys and file paths.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Encode `value` as canonical JSON: sorted object keys, no whitespace.
pub fn canonical_json(value: &Value) -> EvidenceResult<Vec<u8>> {
    let mut out = Vec::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> EvidenceResult<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(item, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => {
            serde_json::to_writer(&mut *out, scalar)?;
        }
    }
    Ok(())
}

/// Compute the SHA-256 hash that seals a record with the given fields.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_fields(
    timestamp: &DateTime<Utc>,
    metadata: &Metadata,
    data: &Value,
    previous_hash: Option<&str>,
) -> EvidenceResult<String> {
    let input = HashInput {
        timestamp,
        metadata,
        data,
        previous_hash,
    };
    let value = serde_json::to_value(&input)?;
    let bytes = canonical_json(&value)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);

    Ok(hex::encode(hasher.finalize()))
}

/// Recompute the hash of `record` from its stored fields, ignoring the
/// stored `hash`.
pub fn recompute_hash(record: &Record) -> EvidenceResult<String> {
    hash_fields(
        &record.timestamp,
        &record.metadata,
        &record.data,
        record.previous_hash.as_deref(),
    )
}

/// True if `record.hash` matches the digest of its own content.
///
/// Serialization failures count as a mismatch.
pub fn content_matches(record: &Record) -> bool {
    matches!(recompute_hash(record), Ok(ref h) if *h == record.hash)
}

/// Locate the first integrity problem in an ordered run of records.
///
/// Checks two rules for every record, in order:
///
/// 1. **Linkage**: `previous_hash` equals the hash of the preceding record,
///    and is `None` for the first one.
/// 2. **Content**: `hash` matches the digest recomputed from the record's
///    own fields.
///
/// Returns the position and a description of the first failure, or `None`
/// when the run is a valid chain from genesis.
pub fn find_chain_break(records: &[Record]) -> Option<(usize, String)> {
    let mut expected_prev: Option<&str> = None;

    for (position, record) in records.iter().enumerate() {
        if let Some(reason) = check_link(record, expected_prev) {
            return Some((position, reason));
        }
        expected_prev = Some(record.hash.as_str());
    }

    None
}

/// Verify an ordered run of records starting at genesis.  An empty run is
/// a valid chain.
pub fn verify_chain(records: &[Record]) -> bool {
    find_chain_break(records).is_none()
}

/// Check one record against the hash its predecessor had.
pub(crate) fn check_link(record: &Record, expected_prev: Option<&str>) -> Option<String> {
    if record.previous_hash.as_deref() != expected_prev {
        return Some(format!(
            "record {} declares previousHash {:?} but the preceding record is {:?}",
            record.hash, record.previous_hash, expected_prev
        ));
    }

    match recompute_hash(record) {
        Ok(recomputed) if recomputed == record.hash => None,
        Ok(recomputed) => Some(format!(
            "record {} content hashes to {}",
            record.hash, recomputed
        )),
        Err(e) => Some(format!("record {} could not be rehashed: {}", record.hash, e)),
    }
}
