//! Run command implementation.

use crate::data;
use anyhow::Result;
use lastro::store::{OutputStore, RawStore};
use lastro::{PipelineConfig, run_batch};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Process every requested instrument and write its outputs.
pub(crate) fn run_pipeline(
    raw_dir: &Path,
    out_dir: &Path,
    tickers: Vec<String>,
    list: Option<&Path>,
    config: &PipelineConfig,
) -> Result<()> {
    let raw = RawStore::new(raw_dir);
    let output = OutputStore::create(out_dir)?;
    let tickers = data::resolve_tickers(&raw, tickers, list)?;
    if tickers.is_empty() {
        anyhow::bail!("No tickers found in {}", raw_dir.display());
    }

    info!(instruments = tickers.len(), raw = %raw_dir.display(), "starting batch");
    let started = Instant::now();
    let report = run_batch(&raw, Some(&output), &tickers, config);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BATCH SUMMARY");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    println!("Processed: {:>6}", report.processed.len());
    println!("Excluded:  {:>6}", report.excluded.len());
    println!("Elapsed:   {:>6.1}s", started.elapsed().as_secs_f64());
    println!("Output:    {}", output.dir().display());

    if !report.excluded.is_empty() {
        println!("\n{:<10} Reason", "Ticker");
        println!("{}", "─".repeat(60));
        for excluded in &report.excluded {
            println!("{:<10} {}", excluded.ticker, excluded.reason);
        }
    }
    println!();

    Ok(())
}
