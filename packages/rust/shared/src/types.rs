//! Core domain types for MinerLedger: extracted listings and ledger rows.

use serde::{Deserialize, Serialize};

/// Ledger column headers, in persisted order.
///
/// Names and order must match exactly for workbooks written by earlier runs
/// to be read back.
pub const LEDGER_COLUMNS: [&str; 5] = ["Miner", "Rarity", "Power", "% Bonus", "Price"];

/// Power values are keyed at this many decimal places (milli-Gh/s).
const KEY_POWER_SCALE: f64 = 1000.0;

// ---------------------------------------------------------------------------
// ItemRecord
// ---------------------------------------------------------------------------

/// One marketplace listing extracted from a card in the pasted markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Display name with the rarity label removed.
    pub title: String,
    /// Rarity label (e.g. `Rare`), empty when the card has none.
    pub rarity: String,
    /// Power in Gh/s.
    pub power: f64,
    /// Bonus as shown on the card (e.g. `7.2%`).
    pub bonus: String,
    /// Price text with the currency suffix removed.
    pub price: String,
}

// ---------------------------------------------------------------------------
// CellValue
// ---------------------------------------------------------------------------

/// A single ledger cell. `Empty` is the missing-value marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a cell from a float, mapping NaN and infinities to `Empty`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Empty
        }
    }

    /// Build a text cell, mapping blank text to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Numeric view of the cell. Text is parsed after trimming.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Empty => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

// ---------------------------------------------------------------------------
// LedgerRow
// ---------------------------------------------------------------------------

/// One persisted row of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// `Miner` column.
    pub name: String,
    /// `Rarity` column.
    pub rarity: String,
    /// `Power` column, Gh/s.
    pub power: CellValue,
    /// `% Bonus` column, a fraction once coerced (0.072 for 7.2%).
    pub bonus: CellValue,
    /// `Price` column.
    pub price: CellValue,
}

impl LedgerRow {
    /// Build a fresh row from an extracted record. Bonus and price stay as
    /// text until the ledger's coercion pass.
    pub fn from_record(record: &ItemRecord) -> Self {
        Self {
            name: record.title.clone(),
            rarity: record.rarity.clone(),
            power: CellValue::number(record.power),
            bonus: CellValue::text(record.bonus.clone()),
            price: CellValue::text(record.price.clone()),
        }
    }

    /// Canonical key for this row, if its power is numeric.
    pub fn key(&self) -> Option<LedgerKey> {
        self.power
            .to_number()
            .and_then(|power| LedgerKey::new(&self.name, power))
    }
}

// ---------------------------------------------------------------------------
// LedgerKey
// ---------------------------------------------------------------------------

/// Identity of a ledger row: trimmed miner name plus power rounded to
/// milli-Gh/s, so values that drift by float rounding still collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey {
    pub name: String,
    pub power_milli: i64,
}

impl LedgerKey {
    /// Returns `None` for non-finite power.
    pub fn new(name: &str, power: f64) -> Option<Self> {
        if !power.is_finite() {
            return None;
        }
        Some(Self {
            name: name.trim().to_string(),
            power_milli: (power * KEY_POWER_SCALE).round() as i64,
        })
    }

    pub fn for_record(record: &ItemRecord) -> Option<Self> {
        Self::new(&record.title, record.power)
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let power = self.power_milli as f64 / KEY_POWER_SCALE;
        write!(f, "{} ({power} Gh/s)", self.name)
    }
}
