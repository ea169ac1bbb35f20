//! Worksheet-backed ledger store (`umya-spreadsheet`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use minerledger_shared::{CellValue, LEDGER_COLUMNS, LedgerRow, MinerLedgerError, Result};
use tracing::{debug, info, instrument};
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::LedgerStore;
use crate::backup::backup_path_for;

/// Header row index (1-based, as in the workbook).
const HEADER_ROW: u32 = 1;

const POWER_FORMAT: &str = "#,##0";
const BONUS_FORMAT: &str = "0.00%";
const PRICE_FORMAT: &str = "0.00";

/// Ledger stored in one worksheet of an `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxStore {
    path: PathBuf,
    sheet: String,
    format_cells: bool,
}

impl XlsxStore {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
            format_cells: true,
        }
    }

    /// Toggle number formats on the numeric columns when writing.
    pub fn with_cell_formats(mut self, enabled: bool) -> Self {
        self.format_cells = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    fn read_book(&self) -> Result<Spreadsheet> {
        umya_spreadsheet::reader::xlsx::read(&self.path).map_err(|e| {
            MinerLedgerError::Storage(format!("failed to read {}: {e}", self.path.display()))
        })
    }
}

impl LedgerStore for XlsxStore {
    #[instrument(skip(self), fields(path = %self.path.display(), sheet = %self.sheet))]
    fn load(&self) -> Result<Vec<LedgerRow>> {
        if !self.path.exists() {
            debug!("workbook not found, starting empty");
            return Ok(Vec::new());
        }

        let book = self.read_book()?;
        let Some(sheet) = book.get_sheet_by_name(&self.sheet) else {
            debug!("worksheet not found, starting empty");
            return Ok(Vec::new());
        };

        let rows = read_rows(sheet)?;
        info!(rows = rows.len(), "loaded ledger");
        Ok(rows)
    }

    #[instrument(skip(self, rows), fields(path = %self.path.display(), sheet = %self.sheet, rows = rows.len()))]
    fn save(&mut self, rows: &[LedgerRow]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MinerLedgerError::io(parent, e))?;
        }

        let mut book = if self.path.exists() {
            self.read_book()?
        } else {
            debug!("creating new workbook");
            umya_spreadsheet::new_file_empty_worksheet()
        };

        if book.get_sheet_by_name(&self.sheet).is_none() {
            book.new_sheet(self.sheet.as_str())
                .map_err(|e| MinerLedgerError::Storage(format!("cannot create sheet: {e}")))?;
        }
        let sheet = book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| MinerLedgerError::Storage(format!("sheet '{}' not found", self.sheet)))?;
        clear_cells(sheet);

        write_rows(sheet, rows, self.format_cells);

        umya_spreadsheet::writer::xlsx::write(&book, &self.path).map_err(|e| {
            MinerLedgerError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;

        info!("saved ledger");
        Ok(())
    }

    fn backup_path(&self) -> Option<PathBuf> {
        Some(backup_path_for(&self.path))
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.sheet)
    }
}

// ---------------------------------------------------------------------------
// Sheet <-> rows
// ---------------------------------------------------------------------------

/// Read ledger rows, locating columns by header name.
fn read_rows(sheet: &Worksheet) -> Result<Vec<LedgerRow>> {
    let last_row = sheet.get_highest_row();
    if last_row < HEADER_ROW {
        return Ok(Vec::new());
    }

    let headers: HashMap<String, u32> = (1..=sheet.get_highest_column())
        .filter_map(|col| {
            let name = cell_text(sheet, col, HEADER_ROW);
            (!name.is_empty()).then_some((name, col))
        })
        .collect();

    let mut columns = [0u32; 5];
    for (slot, name) in columns.iter_mut().zip(LEDGER_COLUMNS) {
        *slot = *headers.get(name).ok_or_else(|| {
            MinerLedgerError::validation(format!("ledger sheet has no `{name}` column"))
        })?;
    }
    let [name_col, rarity_col, power_col, bonus_col, price_col] = columns;

    let mut rows = Vec::new();
    for row in (HEADER_ROW + 1)..=last_row {
        let ledger_row = LedgerRow {
            name: cell_text(sheet, name_col, row),
            rarity: cell_text(sheet, rarity_col, row),
            power: cell_value(sheet, power_col, row),
            bonus: cell_value(sheet, bonus_col, row),
            price: cell_value(sheet, price_col, row),
        };

        if ledger_row == LedgerRow::default() {
            continue;
        }
        rows.push(ledger_row);
    }

    Ok(rows)
}

fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|cell| cell.get_value().trim().to_string())
        .unwrap_or_default()
}

fn cell_value(sheet: &Worksheet, col: u32, row: u32) -> CellValue {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return CellValue::Empty;
    };
    match cell.get_value_number() {
        Some(n) => CellValue::number(n),
        None => CellValue::text(cell.get_value().into_owned()),
    }
}

/// Drop every cell so a shorter ledger leaves no stale rows. The sheet
/// keeps its position in the workbook.
fn clear_cells(sheet: &mut Worksheet) {
    let coords: Vec<(u32, u32)> = sheet
        .get_cell_collection()
        .iter()
        .map(|cell| {
            let c = cell.get_coordinate();
            (*c.get_col_num(), *c.get_row_num())
        })
        .collect();
    for coord in coords {
        sheet.remove_cell(coord);
    }
}

fn write_rows(sheet: &mut Worksheet, rows: &[LedgerRow], format_cells: bool) {
    for (col, name) in (1u32..).zip(LEDGER_COLUMNS) {
        sheet.get_cell_mut((col, HEADER_ROW)).set_value_string(name);
    }

    for (row, ledger_row) in (HEADER_ROW + 1..).zip(rows) {
        write_text(sheet, 1, row, &ledger_row.name);
        write_text(sheet, 2, row, &ledger_row.rarity);
        write_cell(sheet, 3, row, &ledger_row.power, format_cells.then_some(POWER_FORMAT));
        write_cell(sheet, 4, row, &ledger_row.bonus, format_cells.then_some(BONUS_FORMAT));
        write_cell(sheet, 5, row, &ledger_row.price, format_cells.then_some(PRICE_FORMAT));
    }
}

fn write_text(sheet: &mut Worksheet, col: u32, row: u32, text: &str) {
    if !text.is_empty() {
        sheet.get_cell_mut((col, row)).set_value_string(text);
    }
}

fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, value: &CellValue, format: Option<&str>) {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            sheet.get_cell_mut((col, row)).set_value_string(s.as_str());
        }
        CellValue::Number(n) => {
            let cell = sheet.get_cell_mut((col, row));
            cell.set_value_number(*n);
            if let Some(code) = format {
                cell.get_style_mut().get_number_format_mut().set_format_code(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, power: f64, bonus: f64, price: f64) -> LedgerRow {
        LedgerRow {
            name: name.into(),
            rarity: "Rare".into(),
            power: CellValue::Number(power),
            bonus: CellValue::Number(bonus),
            price: CellValue::Number(price),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XlsxStore::new(dir.path().join("absent.xlsx"), "PythonSheet");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets").join("ledger.xlsx");
        let mut store = XlsxStore::new(&path, "PythonSheet");

        let rows = vec![
            row("Chip Miner", 1_000_000.0, 0.072, 12.5),
            LedgerRow {
                name: "Blank Price".into(),
                rarity: String::new(),
                power: CellValue::Number(5.0),
                bonus: CellValue::Number(0.01),
                price: CellValue::Empty,
            },
        ];
        store.save(&rows).unwrap();
        assert!(path.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn missing_sheet_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");
        XlsxStore::new(&path, "Other")
            .save(&[row("A", 1.0, 0.01, 1.0)])
            .unwrap();

        let store = XlsxStore::new(&path, "PythonSheet");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_preserves_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        book.new_sheet("Notes")
            .unwrap()
            .get_cell_mut((1, 1))
            .set_value_string("keep me");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut store = XlsxStore::new(&path, "PythonSheet");
        store.save(&[row("A", 1.0, 0.01, 1.0)]).unwrap();
        store.save(&[row("A", 1.0, 0.01, 2.0), row("B", 2.0, 0.02, 3.0)]).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let notes = book.get_sheet_by_name("Notes").expect("notes sheet kept");
        assert_eq!(notes.get_cell((1, 1)).unwrap().get_value(), "keep me");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].price, CellValue::Number(2.0));
    }

    #[test]
    fn save_keeps_sheet_position_and_drops_stale_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut store = XlsxStore::new(&path, "PythonSheet");
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        book.new_sheet("First").unwrap();
        book.new_sheet("PythonSheet").unwrap();
        book.new_sheet("Last").unwrap();
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        store.save(&[row("A", 1.0, 0.01, 1.0), row("B", 2.0, 0.02, 3.0)]).unwrap();
        store.save(&[row("A", 1.0, 0.01, 4.0)]).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let names: Vec<&str> = book.get_sheet_collection().iter().map(|s| s.get_name()).collect();
        assert_eq!(names, ["First", "PythonSheet", "Last"]);
        assert_eq!(book.get_sheet_by_name("PythonSheet").unwrap().get_highest_row(), 2);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price, CellValue::Number(4.0));
    }

    #[test]
    fn header_lookup_is_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let sheet = book.new_sheet("PythonSheet").unwrap();
        for (col, name) in (1u32..).zip(["Price", "Miner", "Power", "Rarity", "% Bonus"]) {
            sheet.get_cell_mut((col, 1)).set_value_string(name);
        }
        sheet.get_cell_mut((1, 2)).set_value_number(9.5);
        sheet.get_cell_mut((2, 2)).set_value_string("Swapped");
        sheet.get_cell_mut((3, 2)).set_value_number(300.0);
        sheet.get_cell_mut((5, 2)).set_value_string("7.2%");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let loaded = XlsxStore::new(&path, "PythonSheet").load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Swapped");
        assert_eq!(loaded[0].rarity, "");
        assert_eq!(loaded[0].power, CellValue::Number(300.0));
        assert_eq!(loaded[0].bonus, CellValue::Text("7.2%".into()));
        assert_eq!(loaded[0].price, CellValue::Number(9.5));
    }

    #[test]
    fn missing_column_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let sheet = book.new_sheet("PythonSheet").unwrap();
        sheet.get_cell_mut((1, 1)).set_value_string("Miner");
        sheet.get_cell_mut((1, 2)).set_value_string("Orphan");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let err = XlsxStore::new(&path, "PythonSheet").load().unwrap_err();
        assert!(matches!(err, MinerLedgerError::Validation { .. }));
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = XlsxStore::new(&path, "PythonSheet").load().unwrap_err();
        assert!(matches!(err, MinerLedgerError::Storage(_)));
    }

    #[test]
    fn backup_path_sits_next_to_workbook() {
        let store = XlsxStore::new("sheets/ledger.xlsx", "PythonSheet");
        assert_eq!(
            store.backup_path().unwrap(),
            PathBuf::from("sheets/ledger_backup.csv")
        );
        assert_eq!(store.describe(), "sheets/ledger.xlsx [PythonSheet]");
    }
}
