//! In-memory ledger store for dry runs and tests.

use std::path::PathBuf;

use minerledger_shared::{LedgerRow, MinerLedgerError, Result};

/// Holds the ledger in a `Vec`. Can be armed to fail on load or save.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<LedgerRow>,
    fail_load: bool,
    fail_save: bool,
    backup: Option<PathBuf>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Make every `load` fail with a storage error.
    pub fn failing_loads(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Make every `save` fail with a storage error.
    pub fn failing_saves(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Route the CSV fallback to `path`.
    pub fn with_backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl crate::LedgerStore for MemoryStore {
    fn load(&self) -> Result<Vec<LedgerRow>> {
        if self.fail_load {
            return Err(MinerLedgerError::Storage("memory store load disabled".into()));
        }
        Ok(self.rows.clone())
    }

    fn save(&mut self, rows: &[LedgerRow]) -> Result<()> {
        if self.fail_save {
            return Err(MinerLedgerError::Storage("memory store save disabled".into()));
        }
        self.rows = rows.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn backup_path(&self) -> Option<PathBuf> {
        self.backup.clone()
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
