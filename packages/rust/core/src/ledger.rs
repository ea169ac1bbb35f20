//! Keyed ledger table: upsert by (miner, power) and column coercion.
//!
//! Rows keep their insertion order (that is the order they are written back
//! in); a side index maps each [`LedgerKey`] to its row.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use minerledger_shared::{CellValue, ItemRecord, LedgerKey, LedgerRow};

/// What `upsert` did with one record.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// Appended as a new row.
    Inserted,
    /// Price replaced on every row sharing the key. `previous` is the
    /// first row's old price.
    Updated { previous: CellValue, rows: usize },
    /// Left the ledger untouched.
    Skipped { reason: String },
}

/// Counters for one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// In-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
    index: HashMap<LedgerKey, Vec<usize>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows. Rows sharing a key are all kept and all
    /// indexed, so a price update reaches every one of them.
    pub fn from_rows(rows: Vec<LedgerRow>) -> Self {
        let mut index: HashMap<LedgerKey, Vec<usize>> = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let Some(key) = row.key() else {
                continue;
            };
            let slots = index.entry(key).or_default();
            if let Some(&first) = slots.first() {
                warn!(key = %row.name, row = i + 2, first = first + 2, "duplicate ledger key");
            }
            slots.push(i);
        }
        Self { rows, index }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Update the price of every matching row, or append a new row.
    pub fn upsert(&mut self, record: &ItemRecord) -> UpsertOutcome {
        let Some(key) = LedgerKey::for_record(record) else {
            return UpsertOutcome::Skipped {
                reason: format!("non-finite power {}", record.power),
            };
        };

        match self.index.get(&key) {
            Some(slots) => {
                let price = match record.price.trim().parse::<f64>() {
                    Ok(p) if p.is_finite() => p,
                    _ => {
                        return UpsertOutcome::Skipped {
                            reason: format!("invalid price {:?}", record.price),
                        };
                    }
                };
                let mut previous = None;
                for &i in slots {
                    let old = std::mem::replace(&mut self.rows[i].price, CellValue::Number(price));
                    previous.get_or_insert(old);
                }
                debug!(%key, price, rows = slots.len(), "price updated");
                UpsertOutcome::Updated {
                    previous: previous.unwrap_or_default(),
                    rows: slots.len(),
                }
            }
            None => {
                self.rows.push(LedgerRow::from_record(record));
                self.index.insert(key.clone(), vec![self.rows.len() - 1]);
                debug!(%key, "new entry added");
                UpsertOutcome::Inserted
            }
        }
    }

    /// Upsert every record, then run the coercion pass.
    pub fn merge(&mut self, records: &[ItemRecord]) -> MergeReport {
        let mut report = MergeReport::default();

        for record in records {
            match self.upsert(record) {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated { .. } => report.updated += 1,
                UpsertOutcome::Skipped { reason } => {
                    warn!(title = %record.title, power = record.power, %reason, "item skipped");
                    report.skipped += 1;
                }
            }
        }

        self.coerce_columns();

        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            rows = self.rows.len(),
            "merge complete"
        );
        report
    }

    /// Normalize the numeric columns across every row. Values that cannot be
    /// read become `Empty`; no rows are removed.
    pub fn coerce_columns(&mut self) {
        for row in &mut self.rows {
            row.power = coerce_numeric(&row.power);
            row.bonus = coerce_bonus(&row.bonus);
            row.price = coerce_numeric(&row.price);
        }
    }
}

/// Numeric cell, or `Empty` when the value cannot be read as a number.
pub fn coerce_numeric(value: &CellValue) -> CellValue {
    value.to_number().map_or(CellValue::Empty, CellValue::number)
}

/// Bonus as a fraction.
///
/// Text like `7.2%` or `7,2 %` is read as a percentage; numbers above 1 are
/// taken as unscaled percentages; anything else passes through.
pub fn coerce_bonus(value: &CellValue) -> CellValue {
    match value {
        CellValue::Empty => CellValue::Empty,
        CellValue::Number(n) if *n > 1.0 => CellValue::number(n / 100.0),
        CellValue::Number(_) => value.clone(),
        CellValue::Text(text) => {
            let cleaned = text.replace('%', "").replace(',', ".");
            cleaned
                .trim()
                .parse::<f64>()
                .ok()
                .map_or(CellValue::Empty, |n| CellValue::number(n / 100.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, power: f64, bonus: &str, price: &str) -> ItemRecord {
        ItemRecord {
            title: title.into(),
            rarity: "Rare".into(),
            power,
            bonus: bonus.into(),
            price: price.into(),
        }
    }

    fn assert_close(value: &CellValue, expected: f64) {
        let n = value.to_number().expect("numeric cell");
        assert!((n - expected).abs() < 1e-12, "{n} != {expected}");
    }

    // --- Coercion ---

    #[test]
    fn bonus_text_percent() {
        assert_close(&coerce_bonus(&CellValue::Text("7.2%".into())), 0.072);
        assert_close(&coerce_bonus(&CellValue::Text(" 7,2 % ".into())), 0.072);
        assert_close(&coerce_bonus(&CellValue::Text("0.5".into())), 0.005);
    }

    #[test]
    fn bonus_numeric_rescaled_only_above_one() {
        assert_close(&coerce_bonus(&CellValue::Number(7.2)), 0.072);
        assert_eq!(coerce_bonus(&CellValue::Number(0.072)), CellValue::Number(0.072));
        assert_eq!(coerce_bonus(&CellValue::Number(1.0)), CellValue::Number(1.0));
    }

    #[test]
    fn bonus_passthrough_and_garbage() {
        assert_eq!(coerce_bonus(&CellValue::Empty), CellValue::Empty);
        assert_eq!(coerce_bonus(&CellValue::Text("n/a".into())), CellValue::Empty);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(coerce_numeric(&CellValue::Text("12.5".into())), CellValue::Number(12.5));
        assert_eq!(coerce_numeric(&CellValue::Text("1,234".into())), CellValue::Empty);
        assert_eq!(coerce_numeric(&CellValue::Number(3.0)), CellValue::Number(3.0));
        assert_eq!(coerce_numeric(&CellValue::Empty), CellValue::Empty);
    }

    // --- Upsert ---

    #[test]
    fn unknown_key_appends_one_row() {
        let mut ledger = Ledger::new();
        let outcome = ledger.upsert(&record("Chip", 1000.0, "7.2%", "12.5"));

        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.rows()[0].price, CellValue::Text("12.5".into()));
    }

    #[test]
    fn known_key_updates_only_price() {
        let mut ledger = Ledger::from_rows(vec![LedgerRow {
            name: "Chip".into(),
            rarity: "Legendary".into(),
            power: CellValue::Number(1000.0),
            bonus: CellValue::Number(0.05),
            price: CellValue::Number(10.0),
        }]);

        let outcome = ledger.upsert(&record("  Chip ", 1000.0, "99%", "8.75"));

        assert_eq!(
            outcome,
            UpsertOutcome::Updated {
                previous: CellValue::Number(10.0),
                rows: 1,
            }
        );
        assert_eq!(ledger.len(), 1);
        let row = &ledger.rows()[0];
        assert_eq!(row.price, CellValue::Number(8.75));
        assert_eq!(row.rarity, "Legendary");
        assert_eq!(row.bonus, CellValue::Number(0.05));
    }

    #[test]
    fn invalid_price_on_update_leaves_row() {
        let mut ledger = Ledger::new();
        ledger.upsert(&record("Chip", 1000.0, "1%", "10"));
        let outcome = ledger.upsert(&record("Chip", 1000.0, "1%", "ten"));

        assert!(matches!(outcome, UpsertOutcome::Skipped { .. }));
        assert_eq!(ledger.rows()[0].price, CellValue::Text("10".into()));
    }

    #[test]
    fn same_name_different_power_is_new_row() {
        let mut ledger = Ledger::new();
        ledger.upsert(&record("Chip", 1000.0, "1%", "10"));
        ledger.upsert(&record("Chip", 2000.0, "1%", "20"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn float_drift_still_matches() {
        let mut ledger = Ledger::from_rows(vec![LedgerRow {
            name: "Chip".into(),
            power: CellValue::Number(0.3),
            ..LedgerRow::default()
        }]);
        let outcome = ledger.upsert(&record("Chip", 0.1 + 0.2, "1%", "4"));
        assert!(matches!(outcome, UpsertOutcome::Updated { .. }));
    }

    #[test]
    fn duplicate_in_batch_updates_appended_row() {
        let mut ledger = Ledger::new();
        let report = ledger.merge(&[
            record("Chip", 1000.0, "1%", "10"),
            record("Chip", 1000.0, "1%", "9"),
        ]);

        assert_eq!(report, MergeReport { inserted: 1, updated: 1, skipped: 0 });
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.rows()[0].price, CellValue::Number(9.0));
    }

    #[test]
    fn merge_twice_is_idempotent() {
        let records = vec![
            record("A", 5.0, "1.5%", "3"),
            record("B", 2_000_000.0, "7.2%", "120.5"),
        ];
        let mut ledger = Ledger::new();

        let first = ledger.merge(&records);
        assert_eq!(first.inserted, 2);
        let after_first = ledger.rows().to_vec();

        let second = ledger.merge(&records);
        assert_eq!(second, MergeReport { inserted: 0, updated: 2, skipped: 0 });
        assert_eq!(ledger.rows(), after_first.as_slice());
    }

    #[test]
    fn merge_coerces_new_rows() {
        let mut ledger = Ledger::new();
        ledger.merge(&[record("A", 1500.0, "7.2%", "not-a-price")]);

        let row = &ledger.rows()[0];
        assert_eq!(row.power, CellValue::Number(1500.0));
        assert_close(&row.bonus, 0.072);
        assert_eq!(row.price, CellValue::Empty);
    }

    #[test]
    fn from_rows_keeps_unkeyed_rows() {
        let unkeyed = LedgerRow {
            name: "B".into(),
            power: CellValue::Text("fast".into()),
            ..LedgerRow::default()
        };
        let mut ledger = Ledger::from_rows(vec![unkeyed]);
        ledger.upsert(&record("B", 0.0, "1%", "5"));
        assert_eq!(ledger.len(), 2);

        ledger.coerce_columns();
        assert_eq!(ledger.rows()[0].power, CellValue::Empty);
    }

    #[test]
    fn update_reaches_every_row_sharing_a_key() {
        let stale = |power: f64, price: f64| LedgerRow {
            name: "A".into(),
            rarity: "Common".into(),
            power: CellValue::Number(power),
            price: CellValue::Number(price),
            ..LedgerRow::default()
        };
        let mut ledger = Ledger::from_rows(vec![
            stale(0.3, 1.0),
            stale(2.0, 7.0),
            stale(0.1 + 0.2, 2.0),
        ]);
        assert_eq!(ledger.len(), 3);

        let outcome = ledger.upsert(&record("A", 0.3, "1%", "5"));

        assert_eq!(
            outcome,
            UpsertOutcome::Updated {
                previous: CellValue::Number(1.0),
                rows: 2,
            }
        );
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.rows()[0].price, CellValue::Number(5.0));
        assert_eq!(ledger.rows()[1].price, CellValue::Number(7.0));
        assert_eq!(ledger.rows()[2].price, CellValue::Number(5.0));
        assert_eq!(ledger.rows()[2].rarity, "Common");
    }
}
