//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use qbank_core::pipeline::{self, ProgressReporter};
use qbank_normalizer::VideoIndex;
use qbank_segmenter::Segmenter;
use qbank_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// qbank: turn lecture transcripts into per-module quiz sets.
#[derive(Parser)]
#[command(
    name = "qbank",
    version,
    about = "Turn lecture transcripts into per-module practice and memorize quiz sets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.qbank/qbank.toml.
    #[arg(long, env = "QBANK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Normalize raw placeholders into annotated documents.
    Ingest {
        /// Video index CSV.
        #[arg(long)]
        index: Option<PathBuf>,

        /// Directory of raw `*.txt` placeholders.
        #[arg(long)]
        placeholders: Option<PathBuf>,

        /// Output directory for annotated `*.md` documents.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Split annotated documents into segment streams.
    Segment {
        /// Directory of annotated `*.md` documents.
        #[arg(long)]
        transcripts: Option<PathBuf>,

        /// Output directory for `<video_id>.jsonl` streams.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Draft quiz items from segment streams.
    Generate {
        /// Directory of segment streams.
        #[arg(long)]
        segments: Option<PathBuf>,

        /// Draft bank file to write.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Pack curated bank files into per-module sets.
    Pack {
        /// Bank file(s) to pack (can be specified multiple times).
        #[arg(long)]
        bank: Vec<PathBuf>,

        /// Output directory for packed sets.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Only pack this module.
        #[arg(long)]
        module: Option<u32>,
    },

    /// Run all four stages with configured paths.
    Run,

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
        0 => "qbank=info",
        1 => "qbank=debug",
        _ => "qbank=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest {
            index,
            placeholders,
            out,
        } => cmd_ingest(&config, index, placeholders, out),
        Command::Segment { transcripts, out } => cmd_segment(&config, transcripts, out),
        Command::Generate { segments, out } => cmd_generate(&config, segments, out),
        Command::Pack { bank, out, module } => cmd_pack(&config, bank, out, module),
        Command::Run => cmd_run(&config),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_ingest(
    config: &AppConfig,
    index: Option<PathBuf>,
    placeholders: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let index_path = index.unwrap_or_else(|| config.paths.index.clone());
    let placeholders = placeholders.unwrap_or_else(|| config.paths.placeholders.clone());
    let out = out.unwrap_or_else(|| config.paths.transcripts.clone());

    info!(index = %index_path.display(), "loading video index");
    let video_index = VideoIndex::from_csv_path(&index_path)?;

    let reporter = CliProgress::new("Normalizing");
    let report = pipeline::ingest(&video_index, &placeholders, &out, &reporter)?;
    reporter.done();

    println!(
        "  Wrote {} documents to {} ({} unmatched)",
        report.documents.len(),
        out.display(),
        report.synthetic
    );
    Ok(())
}

fn cmd_segment(
    config: &AppConfig,
    transcripts: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let transcripts = transcripts.unwrap_or_else(|| config.paths.transcripts.clone());
    let out = out.unwrap_or_else(|| config.paths.segments.clone());
    let segmenter = Segmenter::new(config.segmenter)?;

    let reporter = CliProgress::new("Segmenting");
    let report = pipeline::segment(&segmenter, &transcripts, &out, &reporter)?;
    reporter.done();

    println!(
        "  Wrote {} segments across {} streams to {}",
        report.segments,
        report.streams.len(),
        out.display()
    );
    Ok(())
}

fn cmd_generate(
    config: &AppConfig,
    segments: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let segments = segments.unwrap_or_else(|| config.paths.segments.clone());
    let out = out.unwrap_or_else(|| config.paths.draft_bank.clone());
    let rules = pipeline::rules_from_config(config)?;

    let reporter = CliProgress::new("Generating");
    let report = pipeline::generate(&rules, &segments, &out, &reporter)?;
    reporter.done();

    println!(
        "  Drafted {} items from {} segments into {}",
        report.items,
        report.segments,
        report.bank_path.display()
    );
    Ok(())
}

fn cmd_pack(
    config: &AppConfig,
    banks: Vec<PathBuf>,
    out: Option<PathBuf>,
    module: Option<u32>,
) -> Result<()> {
    let banks = if banks.is_empty() {
        vec![
            config
                .paths
                .final_bank
                .clone()
                .unwrap_or_else(|| config.paths.draft_bank.clone()),
        ]
    } else {
        banks
    };
    let out = out.unwrap_or_else(|| config.paths.qbank.clone());

    let result = pipeline::pack(&banks, &out, module)?;
    if result.modules.is_empty() {
        return Err(eyre!(
            "no items to pack{}",
            module.map(|m| format!(" for module {m}")).unwrap_or_default()
        ));
    }

    print_pack_summary(&result);
    Ok(())
}

fn cmd_run(config: &AppConfig) -> Result<()> {
    let reporter = CliProgress::new("Starting");
    let report = pipeline::run_all(config, &reporter)?;

    println!();
    println!("  Question bank built!");
    println!("  Documents: {}", report.ingest.documents.len());
    println!("  Segments:  {}", report.segment.segments);
    println!("  Drafted:   {}", report.generate.items);
    print_pack_summary(&report.pack);
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_pack_summary(result: &qbank_packer::PackResult) {
    let modules: Vec<String> = result.modules.iter().map(|m| format!("m{m}")).collect();
    println!(
        "  Packed:    {} ({} files) in {}",
        modules.join(", "),
        result.manifest.sets.len(),
        result.out_dir.display()
    );
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(initial: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.set_message(initial.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_done(&self, name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {name}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
