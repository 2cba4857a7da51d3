//! qbank CLI: build per-module quiz sets from lecture transcripts.
//!
//! Normalizes raw transcript placeholders, segments them, drafts quiz items
//! from keyword rules, and packs curated banks into practice/memorize sets.

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
