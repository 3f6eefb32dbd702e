//! The data source exports are assembled from.
//!
//! In production this is the primary database; the export service only
//! needs the three reads below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evidence_contracts::EvidenceResult;

use crate::payload::{AuditLogEntry, UserRecord, WalletSnapshot};

/// Date bounds an admin attached to an export request.  Both are inclusive
/// and optional.  Recorded verbatim in the record's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl ExportQuery {
    pub fn between(start_date: Option<DateTime<Utc>>, end_date: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| *at >= start)
            && self.end_date.map_or(true, |end| *at <= end)
    }
}

/// Read access to the entities that can be exported.
pub trait ExportSource: Send + Sync {
    /// Audit log entries created within `query`, newest first.
    fn audit_logs(&self, query: &ExportQuery) -> EvidenceResult<Vec<AuditLogEntry>>;

    /// Every wallet with its transaction history.
    fn wallets(&self) -> EvidenceResult<Vec<WalletSnapshot>>;

    /// Every user account.
    fn users(&self) -> EvidenceResult<Vec<UserRecord>>;
}
