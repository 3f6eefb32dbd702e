//! Export service: assemble a payload, seal it into the evidence store, and
//! hand back an envelope carrying the integrity proof.
//!
//! Every export writes exactly one record whose metadata is
//! `{type, user, query}` (`query` is omitted for user exports), then
//! immediately verifies it so the envelope can report `verified`.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use evidence_contracts::{
    record::{METADATA_QUERY_KEY, METADATA_TYPE_KEY, METADATA_USER_KEY},
    EvidenceError, EvidenceResult, Metadata, Record,
};
use evidence_core::EvidenceStore;

use crate::{
    payload::{ExportKind, ExportPayload},
    source::{ExportQuery, ExportSource},
};

/// Integrity proof attached to every export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// Hash of the sealed record; quote it to `confirm` the export later.
    pub export_id: String,
    pub timestamp: DateTime<Utc>,
    /// Result of verifying the record right after it was written.
    pub verified: bool,
}

/// What an admin downloads: `{"logs": [...], "metadata": {...}}` (or
/// `wallets` / `users`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEnvelope {
    #[serde(flatten)]
    pub payload: ExportPayload,
    pub metadata: ExportMetadata,
}

impl ExportEnvelope {
    /// Suggested download name, e.g. `audit_logs_2026-01-20T16:00:00.000Z.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.payload.kind().file_stem(),
            self.metadata
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// A previously issued export that still verifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedExport {
    pub verified: bool,
    pub record: Record,
    #[serde(skip)]
    pub payload: ExportPayload,
}

/// Produces sealed exports from an `ExportSource`.
pub struct ExportService {
    store: Arc<EvidenceStore>,
    source: Box<dyn ExportSource>,
}

impl ExportService {
    pub fn new(store: Arc<EvidenceStore>, source: Box<dyn ExportSource>) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &EvidenceStore {
        &self.store
    }

    /// Assemble and seal one export on behalf of `actor`.
    ///
    /// `query` bounds audit-log exports by creation date; for financial
    /// exports it is recorded in metadata but does not filter; user exports
    /// ignore it.
    ///
    /// # Errors
    ///
    /// Any source or store failure.  There is no partial success: if the
    /// record cannot be sealed, no envelope is produced.
    pub fn export(
        &self,
        kind: ExportKind,
        actor: &str,
        query: &ExportQuery,
    ) -> EvidenceResult<ExportEnvelope> {
        let payload = match kind {
            ExportKind::Audit => ExportPayload::AuditLogs(self.source.audit_logs(query)?),
            ExportKind::Financial => ExportPayload::Wallets(self.source.wallets()?),
            ExportKind::Users => ExportPayload::Users(self.source.users()?),
        };

        let mut metadata = Metadata::new()
            .with(METADATA_TYPE_KEY, kind.tag())
            .with(METADATA_USER_KEY, actor);
        if kind != ExportKind::Users {
            metadata.insert(METADATA_QUERY_KEY, serde_json::to_value(query)?);
        }

        let receipt = self.store.write(&payload.to_data()?, metadata)?;
        let verified = self.store.verify(&receipt.hash);

        if verified {
            info!(
                kind = %kind,
                actor = %actor,
                export_id = %receipt.hash,
                entities = payload.len(),
                "export sealed"
            );
        } else {
            warn!(
                kind = %kind,
                export_id = %receipt.hash,
                "export sealed but failed immediate verification"
            );
        }

        Ok(ExportEnvelope {
            payload,
            metadata: ExportMetadata {
                export_id: receipt.hash,
                timestamp: receipt.timestamp,
                verified,
            },
        })
    }

    /// Re-check a previously issued export.
    ///
    /// # Errors
    ///
    /// `TamperedExport` if the record is missing or no longer matches its
    /// hash; `Serialization` if the record verifies but is not an export.
    pub fn confirm(&self, export_id: &str) -> EvidenceResult<VerifiedExport> {
        if !self.store.verify(export_id) {
            warn!(export_id = %export_id, "export confirmation failed");
            return Err(EvidenceError::TamperedExport {
                hash: export_id.to_string(),
            });
        }

        let record = self.store.read(export_id)?;
        let payload = ExportPayload::from_record(&record)?;

        Ok(VerifiedExport {
            verified: true,
            record,
            payload,
        })
    }
}
