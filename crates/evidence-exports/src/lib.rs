//! # evidence-exports
//!
//! Audit, financial, and user data exports sealed into the evidence store.
//!
//! Each export is assembled from an [`ExportSource`], written to the store
//! as one record, and returned inside an envelope that carries its
//! `exportId` (the record hash) and an immediate verification result.  An
//! admin can later quote the `exportId` to [`ExportService::confirm`] to
//! prove the export has not been altered.
//!
//! All data in [`mock_data`] is fictional.

pub mod mock_data;
pub mod payload;
pub mod service;
pub mod source;

pub use payload::{ExportKind, ExportPayload};
pub use service::{ExportEnvelope, ExportMetadata, ExportService, VerifiedExport};
pub use source::{ExportQuery, ExportSource};

// ── Tests ─────────────────────────────────────────────────────────────────────
