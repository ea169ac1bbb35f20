//! MinerLedger CLI — marketplace listings to a spreadsheet price ledger.
//!
//! Reads a pasted HTML fragment of the miner marketplace, extracts each
//! listing, and upserts it into the configured workbook.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
