//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use minerledger_core::{IngestOptions, Persisted};
use minerledger_extract::{ExtractOptions, extract_items_with_stats};
use minerledger_shared::{AppConfig, CellValue, LedgerRow, init_config, load_config};
use minerledger_storage::{LedgerStore, XlsxStore};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// MinerLedger — keep a price ledger of marketplace miners.
#[derive(Parser)]
#[command(
    name = "minerledger",
    version,
    about = "Extract miner listings from marketplace HTML and upsert them into a spreadsheet ledger.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Ledger location flags shared by several commands.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct LedgerArgs {
    /// Workbook path (overrides `ledger.path`).
    #[arg(long, env = "MINERLEDGER_SHEET_PATH")]
    pub sheet_path: Option<PathBuf>,

    /// Worksheet name (overrides `ledger.sheet`).
    #[arg(long)]
    pub sheet: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract listings from marketplace HTML and merge them into the ledger.
    Ingest {
        /// HTML file to read (defaults to stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        ledger: LedgerArgs,

        /// Merge in memory only; do not write the workbook.
        #[arg(long)]
        dry_run: bool,

        /// Write plain numbers without percent/number formats.
        #[arg(long)]
        no_format: bool,
    },

    /// Print the listings extracted from marketplace HTML as JSON.
    Extract {
        /// HTML file to read (defaults to stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the current ledger.
    Show {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Print rows as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "minerledger=info",
        1 => "minerledger=debug",
        _ => "minerledger=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest {
            input,
            ledger,
            dry_run,
            no_format,
        } => cmd_ingest(input.as_deref(), &ledger, dry_run, no_format),
        Command::Extract { input } => cmd_extract(input.as_deref()),
        Command::Show { ledger, json } => cmd_show(&ledger, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_ingest(input: Option<&Path>, ledger: &LedgerArgs, dry_run: bool, no_format: bool) -> Result<()> {
    let config = load_config()?;
    let markup = read_markup(input)?;

    let mut store = open_store(&config, ledger);
    if no_format {
        store = store.with_cell_formats(false);
    }

    let opts = IngestOptions {
        extract: ExtractOptions::from(&config.extract),
        dry_run,
    };

    info!(store = %store.describe(), dry_run, "ingesting marketplace markup");

    let report = minerledger_core::ingest(&markup, &mut store, &opts)?;

    println!();
    println!("  Cards:     {} found, {} skipped", report.cards_found, report.cards_skipped);
    println!("  Records:   {}", report.records);

    let Some(outcome) = report.outcome else {
        println!("  No data extracted from HTML content.");
        println!();
        return Ok(());
    };

    println!("  Added:     {}", outcome.merge.inserted);
    println!("  Updated:   {}", outcome.merge.updated);
    println!("  Skipped:   {}", outcome.merge.skipped);
    println!("  Rows:      {}", outcome.rows);
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());

    match outcome.persisted {
        Persisted::Store => {
            println!("  Saved to:  {}", store.describe());
            println!();
            Ok(())
        }
        Persisted::NotWritten => {
            println!("  Dry run:   ledger not written");
            println!();
            Ok(())
        }
        Persisted::Backup { path, error } => {
            println!("  Backup:    {}", path.display());
            println!();
            Err(eyre!(
                "could not write {} ({error}); ledger saved to backup {}",
                store.describe(),
                path.display()
            ))
        }
    }
}

fn cmd_extract(input: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let markup = read_markup(input)?;

    let report = extract_items_with_stats(&markup, &ExtractOptions::from(&config.extract));
    println!("{}", serde_json::to_string_pretty(&report.records)?);
    Ok(())
}

fn cmd_show(ledger: &LedgerArgs, json: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config, ledger);
    let rows = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("ledger {} is empty", store.describe());
        return Ok(());
    }

    println!(
        "{:<32} {:<12} {:>16} {:>9} {:>10}",
        "Miner", "Rarity", "Power (Gh/s)", "% Bonus", "Price"
    );
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the workbook store from config plus CLI overrides.
fn open_store(config: &AppConfig, args: &LedgerArgs) -> XlsxStore {
    let path = args
        .sheet_path
        .clone()
        .unwrap_or_else(|| config.ledger.path.clone());
    let sheet = args
        .sheet
        .clone()
        .unwrap_or_else(|| config.ledger.sheet.clone());
    XlsxStore::new(path, sheet).with_cell_formats(config.ledger.format_cells)
}

/// Read markup from a file, or all of stdin.
fn read_markup(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn format_row(row: &LedgerRow) -> String {
    let bonus = match &row.bonus {
        CellValue::Number(n) => format!("{:.2}%", n * 100.0),
        other => other.to_string(),
    };
    format!(
        "{:<32} {:<12} {:>16} {:>9} {:>10}",
        row.name,
        row.rarity,
        row.power.to_string(),
        bonus,
        row.price.to_string()
    )
}
