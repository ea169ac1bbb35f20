//! Shared types, error model, and configuration for MinerLedger.
//!
//! This crate is the foundation depended on by all other MinerLedger crates.
//! It provides:
//! - [`MinerLedgerError`] — the unified error type
//! - Domain types ([`ItemRecord`], [`LedgerRow`], [`CellValue`], [`LedgerKey`])
//! - Configuration ([`AppConfig`], [`LedgerConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractConfig, LedgerConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_config,
};
pub use error::{MinerLedgerError, Result};
pub use types::{CellValue, ItemRecord, LEDGER_COLUMNS, LedgerKey, LedgerRow};
