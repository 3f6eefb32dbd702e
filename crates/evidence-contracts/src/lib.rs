//! # evidence-contracts
//!
//! Shared types and errors for the evidence store.
//!
//! Every crate in the workspace imports from here. No business logic lives in
//! this crate, only data definitions and the error type.

pub mod error;
pub mod record;

pub use error::{EvidenceError, EvidenceResult};
pub use record::{ChainSummary, Metadata, Record, WriteReceipt};
