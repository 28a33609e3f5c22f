//! lastro CLI binary.
//!
//! Provides a command-line interface to the lastro pipeline.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lastro")]
#[command(about = "Corporate-action-adjusted fundamentals, multiples and growth", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON pipeline configuration (defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process instruments and write normalized, multiples and growth files
    Run {
        /// Directory with the raw per-ticker Parquet files
        #[arg(long)]
        raw_dir: PathBuf,

        /// Directory receiving the output files
        #[arg(long)]
        out_dir: PathBuf,

        /// Tickers to process (defaults to every ticker in the raw directory)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// File with one ticker per line
        #[arg(long)]
        list: Option<PathBuf>,
    },

    /// Show the latest daily multiples of one instrument
    Multiples {
        /// Ticker symbol
        ticker: String,

        /// Directory with the raw per-ticker Parquet files
        #[arg(long)]
        raw_dir: PathBuf,

        /// Use quarter-annualized flows instead of trailing twelve months
        #[arg(short, long)]
        quarterly: bool,

        /// Number of trading days to show
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },

    /// Show the latest growth estimates of one instrument
    Growth {
        /// Ticker symbol
        ticker: String,

        /// Directory with the raw per-ticker Parquet files
        #[arg(long)]
        raw_dir: PathBuf,
    },

    /// Print the effective configuration as JSON
    ShowConfig,
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lastro=info".into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = data::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            raw_dir,
            out_dir,
            tickers,
            list,
        } => {
            cmd::run::run_pipeline(&raw_dir, &out_dir, tickers, list.as_deref(), &config)?;
        }
        Commands::Multiples {
            ticker,
            raw_dir,
            quarterly,
            rows,
        } => {
            cmd::multiples::show_multiples(&raw_dir, &ticker, quarterly, rows, &config)?;
        }
        Commands::Growth { ticker, raw_dir } => {
            cmd::growth::show_growth(&raw_dir, &ticker, &config)?;
        }
        Commands::ShowConfig => {
            cmd::config::show_config(&config)?;
        }
    }

    Ok(())
}
