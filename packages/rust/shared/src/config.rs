//! Application configuration for MinerLedger.
//!
//! User config lives at `~/.minerledger/minerledger.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MinerLedgerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "minerledger.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".minerledger";

// ---------------------------------------------------------------------------
// Config structs (matching minerledger.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ledger workbook settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Card extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// `[ledger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Workbook path, relative to the working directory unless absolute.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Worksheet holding the ledger.
    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Apply number formats (percent bonus, grouped power) when writing.
    #[serde(default = "default_true")]
    pub format_cells: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            sheet: default_sheet(),
            format_cells: true,
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("sheets/rollercoin-scraper-sheet.xlsx")
}
fn default_sheet() -> String {
    "PythonSheet".into()
}
fn default_true() -> bool {
    true
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Currency token trailing every price (stripped before storage).
    #[serde(default = "default_currency_suffix")]
    pub currency_suffix: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            currency_suffix: default_currency_suffix(),
        }
    }
}

fn default_currency_suffix() -> String {
    "RLT".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.minerledger/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MinerLedgerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.minerledger/minerledger.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MinerLedgerError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        MinerLedgerError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MinerLedgerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MinerLedgerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MinerLedgerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject configs that cannot address a worksheet.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.ledger.sheet.trim().is_empty() {
        return Err(MinerLedgerError::config("ledger.sheet must not be empty"));
    }
    if config.ledger.path.as_os_str().is_empty() {
        return Err(MinerLedgerError::config("ledger.path must not be empty"));
    }
    Ok(())
}
