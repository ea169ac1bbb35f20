//! Ledger persistence.
//!
//! The [`LedgerStore`] trait is the load/save boundary the merger works
//! against. Implementations:
//! - [`XlsxStore`] — one named worksheet inside an `.xlsx` workbook; other
//!   sheets in the same file are carried through untouched
//! - [`MemoryStore`] — in-memory rows for dry runs and tests
//!
//! [`write_backup_csv`] is the degraded fallback used when the primary store
//! cannot be written.

mod backup;
mod memory;
mod xlsx;

use std::path::PathBuf;

use minerledger_shared::{LedgerRow, Result};

pub use backup::{backup_path_for, write_backup_csv};
pub use memory::MemoryStore;
pub use xlsx::XlsxStore;

/// A persistent table of ledger rows.
pub trait LedgerStore {
    /// Read all rows. A store that does not exist yet returns no rows.
    fn load(&self) -> Result<Vec<LedgerRow>>;

    /// Replace the stored table with `rows`.
    fn save(&mut self, rows: &[LedgerRow]) -> Result<()>;

    /// Where to write the CSV fallback if `save` fails, if anywhere.
    fn backup_path(&self) -> Option<PathBuf>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}
