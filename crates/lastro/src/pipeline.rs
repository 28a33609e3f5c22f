//! The per-instrument pipeline.
//!
//! Stages run in a fixed order on one instrument's inputs: event factors,
//! dividends, normalization, prices, then multiples and growth. Every stage is
//! pure; only normalization can fail.

use lastro_adjust::{
    AdjustedDividendSeries, AdjustedPriceSeries, FactorTable, FundamentalNormalizer,
    NormalizedFundamentalSeries, NormalizerConfig, adjust_dividends, adjust_prices,
};
use lastro_metrics::{
    GrowthConfig, GrowthEngine, GrowthSeries, MultiplesConfig, MultiplesEngine, MultiplesSeries,
};
use lastro_store::{InstrumentInputs, OutputKind, OutputStore};
use lastro_traits::{LastroError, Result, Symbol};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration of every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fundamental normalization.
    pub normalizer: NormalizerConfig,
    /// Multiples engine.
    pub multiples: MultiplesConfig,
    /// Growth engine.
    pub growth: GrowthConfig,
}

impl PipelineConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything derived for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentOutputs {
    /// Ticker.
    pub ticker: Symbol,
    /// Backward adjustment factors for the instrument's share class.
    pub factors: FactorTable,
    /// Dividend payments in today's basis.
    pub dividends: AdjustedDividendSeries,
    /// Per-share fundamentals.
    pub normalized: NormalizedFundamentalSeries,
    /// Adjusted daily prices.
    pub prices: AdjustedPriceSeries,
    /// Quarter-annualized multiples.
    pub quarterly: MultiplesSeries,
    /// Trailing-twelve-month multiples.
    pub annual: MultiplesSeries,
    /// Growth estimates.
    pub growth: GrowthSeries,
}

impl InstrumentOutputs {
    /// Writes the normalized, multiples and growth files for this instrument.
    pub fn persist(&self, store: &OutputStore) -> Result<Vec<PathBuf>> {
        Ok(vec![
            store.write(OutputKind::Normalized, &self.ticker, &self.normalized)?,
            store.write(OutputKind::Multiples, &self.ticker, &self.annual)?,
            store.write(OutputKind::MultiplesQuarterly, &self.ticker, &self.quarterly)?,
            store.write(OutputKind::Growth, &self.ticker, &self.growth)?,
        ])
    }
}

/// Runs every stage on one instrument.
///
/// # Errors
///
/// [`LastroError::InsufficientData`] if the instrument has no fundamental
/// reports, or [`LastroError::DataIntegrity`] if any report is unusable.
pub fn run_instrument(inputs: &InstrumentInputs, config: &PipelineConfig) -> Result<InstrumentOutputs> {
    if inputs.fundamentals.is_empty() {
        return Err(LastroError::InsufficientData(format!(
            "{} has no fundamental reports",
            inputs.ticker
        )));
    }

    let class = inputs.share_class;
    let factors = FactorTable::new(&inputs.events, class);
    let dividends = adjust_dividends(
        &inputs.dividends,
        &factors,
        class,
        config.normalizer.interest_on_equity_withholding,
    );
    let normalized = FundamentalNormalizer::new(config.normalizer.clone()).normalize(
        &inputs.fundamentals,
        &factors,
        &dividends,
    )?;
    let prices = adjust_prices(&inputs.prices, &normalized, &factors);
    let (quarterly, annual) =
        MultiplesEngine::new(config.multiples.clone()).compute(&normalized, &prices);
    let growth = GrowthEngine::new(config.growth.clone()).compute_growth(&normalized);

    debug!(
        ticker = %inputs.ticker,
        reports = normalized.len(),
        days = annual.len(),
        "instrument pipeline complete"
    );
    Ok(InstrumentOutputs {
        ticker: inputs.ticker.clone(),
        factors,
        dividends,
        normalized,
        prices,
        quarterly,
        annual,
        growth,
    })
}
