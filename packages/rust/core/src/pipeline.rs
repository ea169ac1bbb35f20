//! End-to-end `ingest` pipeline: markup → cards → ledger merge → store.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use minerledger_extract::{ExtractOptions, extract_items_with_stats};
use minerledger_shared::{ItemRecord, LedgerRow, MinerLedgerError, Result};
use minerledger_storage::{LedgerStore, write_backup_csv};

use crate::ledger::{Ledger, MergeReport};

/// Configuration for the `ingest` pipeline.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Card extraction options.
    pub extract: ExtractOptions,
    /// Merge in memory but do not write the store.
    pub dry_run: bool,
}

/// Where the merged ledger ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    /// Written to the primary store.
    Store,
    /// Primary write failed; the table went to a CSV backup instead.
    Backup { path: PathBuf, error: String },
    /// Nothing written (dry run, or no records to merge).
    NotWritten,
}

/// Result of merging records into a store.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merge: MergeReport,
    /// Row count after the merge.
    pub rows: usize,
    pub persisted: Persisted,
}

/// Result of the `ingest` pipeline.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Cards found in the markup.
    pub cards_found: usize,
    /// Cards skipped for missing fields.
    pub cards_skipped: usize,
    /// Records extracted.
    pub records: usize,
    /// Merge counters and persistence result. `None` when nothing was extracted.
    pub outcome: Option<MergeOutcome>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

impl IngestReport {
    /// True when the primary store could not be written.
    pub fn fell_back(&self) -> bool {
        matches!(
            self.outcome.as_ref().map(|o| &o.persisted),
            Some(Persisted::Backup { .. })
        )
    }
}

/// Run the full `ingest` pipeline.
///
/// 1. Extract records from the markup
/// 2. Load the ledger (empty when the store is absent or unreadable)
/// 3. Upsert every record and coerce the numeric columns
/// 4. Save, falling back to a CSV backup if the save fails
///
/// Markup without any usable card leaves the store untouched.
#[instrument(skip_all, fields(store = %store.describe(), dry_run = opts.dry_run))]
pub fn ingest(
    markup: &str,
    store: &mut dyn LedgerStore,
    opts: &IngestOptions,
) -> Result<IngestReport> {
    let start = Instant::now();

    let extracted = extract_items_with_stats(markup, &opts.extract);
    let mut report = IngestReport {
        cards_found: extracted.cards_found,
        cards_skipped: extracted.cards_skipped,
        records: extracted.records.len(),
        outcome: None,
        elapsed: start.elapsed(),
    };

    if extracted.records.is_empty() {
        warn!("no data extracted from markup");
        return Ok(report);
    }

    report.outcome = Some(merge_records(&extracted.records, store, opts.dry_run)?);
    report.elapsed = start.elapsed();

    info!(
        records = report.records,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "ingest complete"
    );

    Ok(report)
}

/// Upsert `records` into the ledger held by `store` and write it back.
pub fn merge_records(
    records: &[ItemRecord],
    store: &mut dyn LedgerStore,
    dry_run: bool,
) -> Result<MergeOutcome> {
    let rows = match store.load() {
        Ok(rows) => rows,
        Err(e @ MinerLedgerError::Validation { .. }) => return Err(e),
        Err(e) => {
            warn!(error = %e, "cannot read ledger, starting from an empty table");
            Vec::new()
        }
    };

    let mut ledger = Ledger::from_rows(rows);
    let merge = ledger.merge(records);
    let row_count = ledger.len();

    if dry_run {
        info!(rows = row_count, "dry run, ledger not written");
        return Ok(MergeOutcome {
            merge,
            rows: row_count,
            persisted: Persisted::NotWritten,
        });
    }

    let persisted = persist(store, ledger.rows())?;
    Ok(MergeOutcome {
        merge,
        rows: row_count,
        persisted,
    })
}

/// Save to the store; on failure write the CSV backup once, no retry.
fn persist(store: &mut dyn LedgerStore, rows: &[LedgerRow]) -> Result<Persisted> {
    let save_err = match store.save(rows) {
        Ok(()) => {
            info!(rows = rows.len(), store = %store.describe(), "ledger saved");
            return Ok(Persisted::Store);
        }
        Err(e) => e,
    };

    error!(error = %save_err, store = %store.describe(), "failed to save ledger");

    let Some(path) = store.backup_path() else {
        return Err(save_err);
    };

    match write_backup_csv(&path, rows) {
        Ok(()) => {
            warn!(path = %path.display(), "ledger written to backup instead");
            Ok(Persisted::Backup {
                path,
                error: save_err.to_string(),
            })
        }
        Err(backup_err) => Err(MinerLedgerError::Storage(format!(
            "save failed ({save_err}) and backup to {} failed ({backup_err})",
            path.display()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
