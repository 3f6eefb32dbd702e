//! Typed export payloads.
//!
//! The store keeps `data` as opaque JSON.  On this side of the seam each
//! export kind has a concrete shape, and `ExportPayload` is the sum over
//! them.  A record's metadata `type` tag says which shape its `data` has.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use evidence_contracts::{EvidenceError, EvidenceResult, Record};

/// The three kinds of export the admin console can request.
///
/// Serialized as the metadata type tag stored with each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    #[serde(rename = "audit_export")]
    Audit,
    #[serde(rename = "financial_export")]
    Financial,
    #[serde(rename = "users_export")]
    Users,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::Audit, ExportKind::Financial, ExportKind::Users];

    /// The metadata `type` tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ExportKind::Audit => "audit_export",
            ExportKind::Financial => "financial_export",
            ExportKind::Users => "users_export",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Prefix used when naming the downloaded export file.
    pub fn file_stem(self) -> &'static str {
        match self {
            ExportKind::Audit => "audit_logs",
            ExportKind::Financial => "financial",
            ExportKind::Users => "users",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    /// Accepts the short names (`audit`, `financial`, `users`) and the full
    /// metadata tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audit" => Ok(ExportKind::Audit),
            "financial" => Ok(ExportKind::Financial),
            "users" => Ok(ExportKind::Users),
            other => Self::from_tag(other).ok_or_else(|| {
                format!(
                    "unknown export kind '{}'; expected audit, financial, or users",
                    other
                )
            }),
        }
    }
}

// ── Audit logs ───────────────────────────────────────────────────────────────

/// One administrative action from the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    /// Id of the user who performed the action, if known.
    pub actor: Option<String>,
    pub target: Option<String>,
    #[serde(default)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

// ── Wallets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
    Fee,
    Tip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount in whole tokens.
    pub amount: i64,
    pub from: Option<String>,
    pub to: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user's wallet and its full transaction history at export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub user: String,
    pub balance: i64,
    pub currency: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub updated_at: DateTime<Utc>,
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Creator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotStarted,
    Pending,
    Verified,
    Rejected,
    Flagged,
}

/// A user account as exported.  Credentials are never part of the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub verified_creator: bool,
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
}

// ── Sum type ─────────────────────────────────────────────────────────────────

/// The payload of one export.
///
/// Serializes externally tagged as `{"logs": [...]}`, `{"wallets": [...]}`
/// or `{"users": [...]}`, which is the body shape admins download.  Only
/// the inner array is sealed into the store as the record's `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportPayload {
    #[serde(rename = "logs")]
    AuditLogs(Vec<AuditLogEntry>),
    #[serde(rename = "wallets")]
    Wallets(Vec<WalletSnapshot>),
    #[serde(rename = "users")]
    Users(Vec<UserRecord>),
}

impl ExportPayload {
    pub fn kind(&self) -> ExportKind {
        match self {
            ExportPayload::AuditLogs(_) => ExportKind::Audit,
            ExportPayload::Wallets(_) => ExportKind::Financial,
            ExportPayload::Users(_) => ExportKind::Users,
        }
    }

    /// Number of exported entities.
    pub fn len(&self) -> usize {
        match self {
            ExportPayload::AuditLogs(v) => v.len(),
            ExportPayload::Wallets(v) => v.len(),
            ExportPayload::Users(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The JSON sealed into the store: the bare entity array.
    pub fn to_data(&self) -> EvidenceResult<Value> {
        let value = match self {
            ExportPayload::AuditLogs(v) => serde_json::to_value(v)?,
            ExportPayload::Wallets(v) => serde_json::to_value(v)?,
            ExportPayload::Users(v) => serde_json::to_value(v)?,
        };
        Ok(value)
    }

    /// Decode a stored record back into a typed payload using its metadata
    /// type tag.
    pub fn from_record(record: &Record) -> EvidenceResult<Self> {
        let tag = record.metadata.kind().ok_or_else(|| EvidenceError::Serialization {
            reason: format!("record {} has no export type tag", record.hash),
        })?;
        let kind = ExportKind::from_tag(tag).ok_or_else(|| EvidenceError::Serialization {
            reason: format!("record {} has unknown export type '{}'", record.hash, tag),
        })?;

        let data = record.data.clone();
        let payload = match kind {
            ExportKind::Audit => ExportPayload::AuditLogs(serde_json::from_value(data)?),
            ExportKind::Financial => ExportPayload::Wallets(serde_json::from_value(data)?),
            ExportKind::Users => ExportPayload::Users(serde_json::from_value(data)?),
        };
        Ok(payload)
    }
}
