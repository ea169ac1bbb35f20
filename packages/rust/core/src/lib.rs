//! Ledger merging and pipeline orchestration for MinerLedger.
//!
//! This crate ties card extraction and ledger storage together into the
//! end-to-end `ingest` workflow.

pub mod ledger;
pub mod pipeline;

pub use ledger::{Ledger, MergeReport, UpsertOutcome, coerce_bonus, coerce_numeric};
pub use pipeline::{IngestOptions, IngestReport, MergeOutcome, Persisted, ingest, merge_records};
