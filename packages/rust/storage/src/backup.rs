//! Plain CSV fallback for when the workbook cannot be written.

use std::path::{Path, PathBuf};

use minerledger_shared::{LEDGER_COLUMNS, LedgerRow, MinerLedgerError, Result};

/// `<dir>/<stem>_backup.csv` for a workbook at `<dir>/<stem>.xlsx`.
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".into());
    path.with_file_name(format!("{stem}_backup.csv"))
}

/// Write the ledger as CSV with the workbook's header row. Missing values
/// become empty fields.
pub fn write_backup_csv(path: &Path, rows: &[LedgerRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MinerLedgerError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer
        .write_record(LEDGER_COLUMNS)
        .map_err(|e| csv_error(path, e))?;

    for row in rows {
        writer
            .write_record([
                row.name.clone(),
                row.rarity.clone(),
                row.power.to_string(),
                row.bonus.to_string(),
                row.price.to_string(),
            ])
            .map_err(|e| csv_error(path, e))?;
    }

    writer.flush().map_err(|e| MinerLedgerError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote CSV backup");
    Ok(())
}

fn csv_error(path: &Path, e: csv::Error) -> MinerLedgerError {
    MinerLedgerError::Storage(format!("CSV backup to {} failed: {e}", path.display()))
}
