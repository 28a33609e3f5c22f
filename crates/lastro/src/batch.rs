//! Multi-instrument runs.
//!
//! Instruments are processed in parallel and independently: a failure in one
//! is recorded as an exclusion and never stops the others.

use crate::pipeline::{InstrumentOutputs, PipelineConfig, run_instrument};
use lastro_store::{InstrumentInputs, OutputStore, RawStore};
use lastro_traits::{Result, Symbol};
use rayon::prelude::*;
use tracing::{info, warn};

/// An instrument left out of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excluded {
    /// Ticker.
    pub ticker: Symbol,
    /// Why it was excluded.
    pub reason: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tickers processed successfully, sorted.
    pub processed: Vec<Symbol>,
    /// Tickers that failed, sorted by ticker.
    pub excluded: Vec<Excluded>,
}

impl BatchReport {
    fn from_results<T>(results: Vec<(Symbol, Result<T>)>) -> (Self, Vec<T>) {
        let mut report = Self::default();
        let mut outputs = Vec::new();
        for (ticker, result) in results {
            match result {
                Ok(output) => {
                    report.processed.push(ticker);
                    outputs.push(output);
                }
                Err(e) => {
                    warn!(%ticker, error = %e, "instrument excluded");
                    report.excluded.push(Excluded {
                        ticker,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.processed.sort();
        report.excluded.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        (report, outputs)
    }

    /// Number of instruments attempted.
    pub fn total(&self) -> usize {
        self.processed.len() + self.excluded.len()
    }
}

/// Loads, runs and optionally persists every ticker in `tickers`.
pub fn run_batch(
    raw: &RawStore,
    output: Option<&OutputStore>,
    tickers: &[Symbol],
    config: &PipelineConfig,
) -> BatchReport {
    let results: Vec<(Symbol, Result<()>)> = tickers
        .par_iter()
        .map(|ticker| {
            let result = raw
                .load(ticker)
                .and_then(|inputs| run_instrument(&inputs, config))
                .and_then(|outputs| {
                    if let Some(store) = output {
                        outputs.persist(store)?;
                    }
                    info!(
                        %ticker,
                        reports = outputs.normalized.len(),
                        days = outputs.annual.len(),
                        "processed instrument"
                    );
                    Ok(())
                });
            (ticker.clone(), result)
        })
        .collect();

    BatchReport::from_results(results).0
}

/// Runs already-loaded instruments, returning the successful outputs in
/// ticker order alongside the report.
pub fn run_loaded(
    inputs: &[InstrumentInputs],
    config: &PipelineConfig,
) -> (Vec<InstrumentOutputs>, BatchReport) {
    let results: Vec<(Symbol, Result<InstrumentOutputs>)> = inputs
        .par_iter()
        .map(|instrument| (instrument.ticker.clone(), run_instrument(instrument, config)))
        .collect();

    let (report, mut outputs) = BatchReport::from_results(results);
    outputs.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    (outputs, report)
}
