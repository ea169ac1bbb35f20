//! Marketplace card extraction.
//!
//! Parses a pasted HTML fragment of the miner marketplace and turns every
//! `a.marketplace-buy-item-card` into an [`ItemRecord`]. Cards are processed
//! independently: a card missing any required field is logged and skipped,
//! never aborting the batch.

mod units;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use minerledger_shared::ItemRecord;

pub use units::{PowerUnit, normalize_power, split_title, strip_price};

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static CARD_SEL: LazyLock<Selector> = LazyLock::new(|| selector("a.marketplace-buy-item-card"));
static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("p.item-price"));
static POWER_SEL: LazyLock<Selector> = LazyLock::new(|| selector("span.item-addition-power"));
static BONUS_SEL: LazyLock<Selector> = LazyLock::new(|| selector("span.item-addition-bonus"));
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("p.item-title"));
static RARITY_SEL: LazyLock<Selector> = LazyLock::new(|| selector("span"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for card extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Currency token stripped from the end of each price.
    pub currency_suffix: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            currency_suffix: "RLT".into(),
        }
    }
}

impl From<&minerledger_shared::ExtractConfig> for ExtractOptions {
    fn from(config: &minerledger_shared::ExtractConfig) -> Self {
        Self {
            currency_suffix: config.currency_suffix.clone(),
        }
    }
}

/// Records plus batch counters from one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub records: Vec<ItemRecord>,
    pub cards_found: usize,
    pub cards_skipped: usize,
}

/// Why a single card was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("{0} element not found")]
    MissingElement(&'static str),
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every well-formed card with default options.
pub fn extract_items(markup: &str) -> Vec<ItemRecord> {
    extract_items_with_stats(markup, &ExtractOptions::default()).records
}

/// Extract every well-formed card, counting found and skipped cards.
#[instrument(skip_all, fields(markup_len = markup.len()))]
pub fn extract_items_with_stats(markup: &str, opts: &ExtractOptions) -> ExtractReport {
    let doc = Html::parse_fragment(markup);
    let mut report = ExtractReport::default();

    for (i, card) in doc.select(&CARD_SEL).enumerate() {
        report.cards_found += 1;
        let index = i + 1;

        match parse_card(card, opts) {
            Ok(record) => {
                debug!(
                    card = index,
                    title = %record.title,
                    rarity = %record.rarity,
                    power = record.power,
                    bonus = %record.bonus,
                    price = %record.price,
                    "card extracted"
                );
                report.records.push(record);
            }
            Err(e) => {
                warn!(card = index, error = %e, "skipping card");
                report.cards_skipped += 1;
            }
        }
    }

    info!(
        found = report.cards_found,
        extracted = report.records.len(),
        skipped = report.cards_skipped,
        "extraction complete"
    );

    report
}

/// Pull the five fields out of one card.
fn parse_card(card: ElementRef<'_>, opts: &ExtractOptions) -> Result<ItemRecord, CardError> {
    let price_text = first_text(card, &PRICE_SEL).ok_or(CardError::MissingElement("price"))?;
    let price = strip_price(&price_text, &opts.currency_suffix);

    let power_text = first_text(card, &POWER_SEL).ok_or(CardError::MissingElement("power"))?;
    let power = normalize_power(&power_text);

    let bonus = first_text(card, &BONUS_SEL)
        .ok_or(CardError::MissingElement("bonus"))?
        .trim()
        .to_string();

    let title_el = card
        .select(&TITLE_SEL)
        .next()
        .ok_or(CardError::MissingElement("title"))?;
    let rarity = title_el
        .select(&RARITY_SEL)
        .next()
        .map(|span| element_text(span).trim().to_string())
        .unwrap_or_default();
    let title = split_title(&element_text(title_el), &rarity);

    Ok(ItemRecord {
        title,
        rarity,
        power,
        bonus,
        price,
    })
}

fn first_text(card: ElementRef<'_>, sel: &Selector) -> Option<String> {
    card.select(sel).next().map(element_text)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
