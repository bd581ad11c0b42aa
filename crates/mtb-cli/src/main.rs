//! mtb entry point.
//!
//! This file is intentionally thin: it sets up tracing, parses arguments,
//! and dispatches. All command handlers live in `commands/`.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mtb")]
#[command(about = "Multi-timeframe backtest data pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve required monthly files and fetch whatever is missing.
    EnsureData {
        /// Path to the symbols configuration JSON (list of symbol entries).
        #[arg(long)]
        symbols_config: String,

        /// Directory holding the monthly CSV cache.
        #[arg(long)]
        data_dir: String,

        /// Optional exchange configuration JSON; without it, missing files
        /// are an error instead of a download.
        #[arg(long)]
        exchange_config: Option<String>,
    },

    /// Download specific months for one symbol/timeframe, overwriting any
    /// cached copies.
    Fetch {
        #[arg(long)]
        symbol: String,

        /// Canonical timeframe string (e.g. 1m, 5m, 1h, 1d).
        #[arg(long)]
        timeframe: String,

        #[arg(long)]
        year: i32,

        /// Comma-separated month numbers, e.g. 1,2,3.
        #[arg(long)]
        months: String,

        #[arg(long)]
        data_dir: String,

        /// Optional exchange configuration JSON.
        #[arg(long)]
        exchange_config: Option<String>,
    },

    /// Dry-run alignment per symbol: prints the alignment instant and the
    /// per-timeframe warm-up/replay split without running any strategy.
    AlignReport {
        #[arg(long)]
        symbols_config: String,

        #[arg(long)]
        data_dir: String,

        /// Warm-up window length in candles.
        #[arg(long, default_value_t = 100)]
        warmup: usize,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::EnsureData {
            symbols_config,
            data_dir,
            exchange_config,
        } => commands::data::ensure_data(&symbols_config, &data_dir, exchange_config.as_deref()),
        Commands::Fetch {
            symbol,
            timeframe,
            year,
            months,
            data_dir,
            exchange_config,
        } => commands::data::fetch(
            &symbol,
            &timeframe,
            year,
            &months,
            &data_dir,
            exchange_config.as_deref(),
        ),
        Commands::AlignReport {
            symbols_config,
            data_dir,
            warmup,
        } => commands::align::align_report(&symbols_config, &data_dir, warmup),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
