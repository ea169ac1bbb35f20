//! Field normalization for marketplace cards: power units, prices, titles.

use std::sync::LazyLock;

use regex::Regex;

/// Hash-rate units shown on cards, each 1000× the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUnit {
    Ghs,
    Ths,
    Phs,
}

impl PowerUnit {
    /// Multiplier to Gh/s.
    pub fn factor(self) -> f64 {
        match self {
            Self::Ghs => 1.0,
            Self::Ths => 1_000.0,
            Self::Phs => 1_000_000.0,
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "Gh/s" => Some(Self::Ghs),
            "Th/s" => Some(Self::Ths),
            "Ph/s" => Some(Self::Phs),
            _ => None,
        }
    }
}

static POWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<value>[+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*(?P<unit>[A-Za-z]h/s)")
        .expect("valid regex")
});

/// Convert a card power label (`"1,000 Th/s"`) to Gh/s.
///
/// Total: any text without a recognized unit, or whose number cannot be read,
/// yields `0.0`.
pub fn normalize_power(text: &str) -> f64 {
    let cleaned = text.replace(',', "");

    let Some(caps) = POWER_RE.captures(&cleaned) else {
        tracing::debug!(text, "no recognized power unit");
        return 0.0;
    };

    let Some(unit) = PowerUnit::from_symbol(&caps["unit"]) else {
        tracing::debug!(text, unit = &caps["unit"], "unsupported power unit");
        return 0.0;
    };

    match caps["value"].parse::<f64>() {
        Ok(value) => value * unit.factor(),
        Err(_) => 0.0,
    }
}

/// Trim a price label and drop its trailing currency token.
pub fn strip_price(text: &str, currency_suffix: &str) -> String {
    let text = text.trim();
    let stripped = if currency_suffix.is_empty() {
        text
    } else {
        text.strip_suffix(currency_suffix).unwrap_or(text)
    };
    stripped.trim().to_string()
}

/// Remove every occurrence of the rarity label from the full title text.
pub fn split_title(full: &str, rarity: &str) -> String {
    if rarity.is_empty() {
        return full.trim().to_string();
    }
    full.replace(rarity, "").trim().to_string()
}
