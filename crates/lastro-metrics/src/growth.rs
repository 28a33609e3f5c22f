//! Trend growth of fundamentals over rolling multi-year windows.
//!
//! For each report date and window length, the quarterly values inside the
//! window are fitted with a log-linear trend and the quarterly slope is
//! compounded to an annual rate. Windows that are too short, or whose values
//! are all negative, are flagged instead of estimated.

use lastro_adjust::{NormalizedFundamental, NormalizedFundamentalSeries};
use lastro_traits::frame::{date_column, float_column, str_column};
use lastro_traits::stats::{linear_trend, mean};
use lastro_traits::{Date, Result, ToFrame, years_before};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Reported value of a window whose values are all negative.
pub const DEGENERATE_GROWTH: f64 = -1.01;

/// Configuration for growth estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Window lengths in years (default: 1, 2, 4, 8).
    pub windows: Vec<u32>,

    /// Extra days reaching back past the window start (default: 10).
    pub slack_days: i64,

    /// Upper bound on any estimated annual rate (default: 2.0).
    pub max_rate: f64,

    /// Annual rate reported when the trend fit fails (default: 1.0).
    pub fallback_rate: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            windows: vec![1, 2, 4, 8],
            slack_days: 10,
            max_rate: 2.0,
            fallback_rate: 1.0,
        }
    }
}

/// Fundamentals tracked for growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedFundamental {
    /// Revenue per share.
    Revenue,
    /// EBITDA per share.
    Ebitda,
    /// Net income per share.
    NetIncome,
    /// Dividends per share paid in the reporting period.
    Dividends,
}

impl TrackedFundamental {
    /// Every tracked fundamental, in output order.
    pub const ALL: [Self; 4] = [Self::Revenue, Self::Ebitda, Self::NetIncome, Self::Dividends];

    /// Column label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Ebitda => "ebitda",
            Self::NetIncome => "net_income",
            Self::Dividends => "dividends",
        }
    }

    /// The tracked value of one report.
    pub fn value(&self, row: &NormalizedFundamental) -> f64 {
        match self {
            Self::Revenue => row.revenue,
            Self::Ebitda => row.ebitda,
            Self::NetIncome => row.net_income,
            Self::Dividends => row.dividends,
        }
    }
}

impl fmt::Display for TrackedFundamental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one growth estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthRate {
    /// Estimated annual rate.
    Value(f64),
    /// Fewer than four observations per window year.
    Insufficient,
    /// Every value in the window is negative.
    Degenerate,
}

impl GrowthRate {
    /// The number written to output: the rate, `0.0` when history is
    /// insufficient, or [`DEGENERATE_GROWTH`].
    pub const fn value(&self) -> f64 {
        match self {
            Self::Value(rate) => *rate,
            Self::Insufficient => 0.0,
            Self::Degenerate => DEGENERATE_GROWTH,
        }
    }

    /// Whether this is an estimated rate.
    pub const fn is_estimate(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Growth of one fundamental at one report date.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRow {
    /// Fundamental being tracked.
    pub fundamental: TrackedFundamental,
    /// Report date the windows end at.
    pub date: Date,
    /// One estimate per configured window, in ascending window order.
    pub rates: Vec<GrowthRate>,
    /// Mean reported value of every window except the shortest.
    pub average: f64,
}

/// Growth estimates of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSeries {
    windows: Vec<u32>,
    rows: Vec<GrowthRow>,
}

impl GrowthSeries {
    /// Window lengths in years, ascending.
    pub fn windows(&self) -> &[u32] {
        &self.windows
    }

    /// All rows, grouped by fundamental and ascending by date within each.
    pub fn rows(&self) -> &[GrowthRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for one fundamental.
    pub fn of(&self, fundamental: TrackedFundamental) -> impl Iterator<Item = &GrowthRow> {
        self.rows.iter().filter(move |r| r.fundamental == fundamental)
    }

    /// The row for `fundamental` at `date`.
    pub fn get(&self, fundamental: TrackedFundamental, date: Date) -> Option<&GrowthRow> {
        self.of(fundamental).find(|r| r.date == date)
    }

    /// The latest row for `fundamental`.
    pub fn latest(&self, fundamental: TrackedFundamental) -> Option<&GrowthRow> {
        self.of(fundamental).last()
    }

    /// The estimate for `years` in `row`, if that window is configured.
    pub fn rate(&self, row: &GrowthRow, years: u32) -> Option<GrowthRate> {
        self.windows
            .iter()
            .position(|w| *w == years)
            .and_then(|i| row.rates.get(i).copied())
    }
}

/// Estimates rolling trend growth for the tracked fundamentals.
#[derive(Debug, Clone, Default)]
pub struct GrowthEngine {
    config: GrowthConfig,
}

impl GrowthEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub const fn new(config: GrowthConfig) -> Self {
        Self { config }
    }

    /// Growth of every tracked fundamental at every report date.
    pub fn compute_growth(&self, normalized: &NormalizedFundamentalSeries) -> GrowthSeries {
        let mut windows = self.config.windows.clone();
        windows.sort_unstable();
        windows.dedup();

        let reports = normalized.rows();
        let mut rows = Vec::with_capacity(reports.len() * TrackedFundamental::ALL.len());
        for fundamental in TrackedFundamental::ALL {
            let values: Vec<f64> = reports.iter().map(|r| fundamental.value(r)).collect();
            for (i, report) in reports.iter().enumerate() {
                let rates: Vec<GrowthRate> = windows
                    .iter()
                    .map(|&years| {
                        let lo = self.window_start(reports, report.report_date, years).min(i);
                        self.estimate(fundamental, report.report_date, &values[lo..=i], years)
                    })
                    .collect();
                let longer: Vec<f64> = rates.iter().skip(1).map(GrowthRate::value).collect();
                rows.push(GrowthRow {
                    fundamental,
                    date: report.report_date,
                    average: mean(&longer).unwrap_or(0.0),
                    rates,
                });
            }
        }

        debug!(
            reports = reports.len(),
            windows = windows.len(),
            "computed growth estimates"
        );
        GrowthSeries { windows, rows }
    }

    /// Index of the first report inside `[as_of - years - slack, as_of]`.
    fn window_start(&self, reports: &[NormalizedFundamental], as_of: Date, years: u32) -> usize {
        let start = years_before(as_of, years)
            .checked_sub_signed(chrono::Duration::days(self.config.slack_days))
            .unwrap_or(Date::MIN);
        reports.partition_point(|r| r.report_date < start)
    }

    fn estimate(
        &self,
        fundamental: TrackedFundamental,
        as_of: Date,
        window: &[f64],
        years: u32,
    ) -> GrowthRate {
        if window.len() < 4 * years as usize {
            return GrowthRate::Insufficient;
        }

        let rate = match self.annual_trend(window) {
            GrowthRate::Value(rate) => rate,
            other => return other,
        };
        if !rate.is_finite() {
            warn!(%fundamental, %as_of, years, "trend fit failed, using fallback rate");
        }
        let rate = if rate.is_finite() { rate } else { self.config.fallback_rate };

        // Period payouts are lumpy; the annual rate is read as quarterly.
        let rate = match fundamental {
            TrackedFundamental::Dividends => (1.0 + rate).powf(0.25) - 1.0,
            _ => rate,
        };
        GrowthRate::Value(rate.min(self.config.max_rate))
    }

    /// Annualized log-linear trend of quarterly `values`, `NaN` if the fit
    /// fails.
    fn annual_trend(&self, values: &[f64]) -> GrowthRate {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if max < 0.0 {
            return GrowthRate::Degenerate;
        }
        if max == min {
            return GrowthRate::Value(0.0);
        }

        let shift = if min < 0.0 { (max - min) / 2.0 } else { 0.0 };
        let logs = Array1::from_iter(values.iter().map(|v| (v + shift).ln()));
        let rate = linear_trend(&logs)
            .map(|trend| trend.slope.exp().powi(4) - 1.0)
            .unwrap_or(f64::NAN);
        GrowthRate::Value(rate)
    }
}

impl ToFrame for GrowthSeries {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let mut columns = vec![
            str_column("fundamental", rows.iter().map(|r| r.fundamental.label())),
            date_column("date", rows.iter().map(|r| r.date))?,
        ];
        for (i, years) in self.windows.iter().enumerate() {
            columns.push(float_column(
                &format!("growth_{years}y"),
                rows.iter().map(|r| r.rates[i].value()),
            ));
        }
        columns.push(float_column("growth_average", rows.iter().map(|r| r.average)));
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lastro_adjust::{AdjustedDividendSeries, FactorTable, FundamentalNormalizer};
    use lastro_traits::RawFundamentalRecord;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarter_ends(first_year: i32, n: usize) -> Vec<Date> {
        let ends = [(3, 31), (6, 30), (9, 30), (12, 31)];
        (0..n)
            .map(|i| {
                let (m, day) = ends[i % 4];
                d(first_year + (i / 4) as i32, m, day)
            })
            .collect()
    }

    /// One share outstanding, so per-share values equal the inputs.
    fn series(revenue: &[f64]) -> NormalizedFundamentalSeries {
        let raw: Vec<RawFundamentalRecord> = quarter_ends(2015, revenue.len())
            .into_iter()
            .zip(revenue)
            .map(|(date, value)| {
                let mut r = RawFundamentalRecord::new(date, 1.0, 0.0);
                r.revenue = *value;
                r.ebitda = *value;
                r.net_income = -1.0;
                r
            })
            .collect();
        FundamentalNormalizer::default()
            .normalize(&raw, &FactorTable::empty(), &AdjustedDividendSeries::default())
            .unwrap()
    }

    fn latest(series: &GrowthSeries, fundamental: TrackedFundamental, years: u32) -> GrowthRate {
        let row = series.latest(fundamental).unwrap();
        series.rate(row, years).unwrap()
    }

    #[test]
    fn test_doubling_is_clamped() {
        let values: Vec<f64> = (0..9).map(|i| 2f64.powi(i)).collect();
        let growth = GrowthEngine::default().compute_growth(&series(&values));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 1), GrowthRate::Value(2.0));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 2), GrowthRate::Value(2.0));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 4), GrowthRate::Insufficient);
    }

    #[test]
    fn test_steady_growth_rate() {
        // 10% per year compounded quarterly.
        let q = 1.1f64.powf(0.25);
        let values: Vec<f64> = (0..8).map(|i| 100.0 * q.powi(i)).collect();
        let growth = GrowthEngine::default().compute_growth(&series(&values));
        match latest(&growth, TrackedFundamental::Revenue, 1) {
            GrowthRate::Value(rate) => assert_relative_eq!(rate, 0.1, epsilon = 1e-9),
            other => panic!("expected estimate, got {other:?}"),
        }
        match latest(&growth, TrackedFundamental::Revenue, 2) {
            GrowthRate::Value(rate) => assert_relative_eq!(rate, 0.1, epsilon = 1e-9),
            other => panic!("expected estimate, got {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_history_reports_zero() {
        let growth = GrowthEngine::default().compute_growth(&series(&[100.0, 110.0]));
        let rate = latest(&growth, TrackedFundamental::Revenue, 1);
        assert_eq!(rate, GrowthRate::Insufficient);
        assert_eq!(rate.value(), 0.0);
        assert!(!rate.is_estimate());
    }

    #[test]
    fn test_all_negative_is_degenerate() {
        let growth = GrowthEngine::default().compute_growth(&series(&[1.0; 8]));
        let rate = latest(&growth, TrackedFundamental::NetIncome, 1);
        assert_eq!(rate, GrowthRate::Degenerate);
        assert_relative_eq!(rate.value(), DEGENERATE_GROWTH);
    }

    #[test]
    fn test_flat_window_is_zero() {
        let growth = GrowthEngine::default().compute_growth(&series(&[0.0; 8]));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 2), GrowthRate::Value(0.0));
        assert_eq!(latest(&growth, TrackedFundamental::Dividends, 2), GrowthRate::Value(0.0));
    }

    #[test]
    fn test_mixed_sign_window_is_shifted() {
        let values = [-2.0, -1.0, 1.0, 2.0, 3.0];
        let growth = GrowthEngine::default().compute_growth(&series(&values));
        match latest(&growth, TrackedFundamental::Revenue, 1) {
            GrowthRate::Value(rate) => {
                // Window covers the last five quarters and is shifted by 2.5.
                let logs = Array1::from_iter(values.iter().map(|v| (v + 2.5f64).ln()));
                let slope = linear_trend(&logs).unwrap().slope;
                assert_relative_eq!(rate, (slope.exp().powi(4) - 1.0).min(2.0), epsilon = 1e-12);
            }
            other => panic!("expected estimate, got {other:?}"),
        }
    }

    #[test]
    fn test_dividend_rate_converted_from_quarterly_observations() {
        let engine = GrowthEngine::default();
        let rate = engine.estimate(
            TrackedFundamental::Dividends,
            d(2020, 12, 31),
            &[1.0, 2.0, 4.0, 8.0],
            1,
        );
        // Revenue-style rate of 2^4 - 1 = 15 becomes 16^0.25 - 1 = 1.
        match rate {
            GrowthRate::Value(rate) => assert_relative_eq!(rate, 1.0, epsilon = 1e-12),
            other => panic!("expected estimate, got {other:?}"),
        }
    }

    #[test]
    fn test_dividend_growth_follows_period_payouts() {
        // Payouts double every quarter while the reported yield stays flat.
        let raw: Vec<RawFundamentalRecord> = quarter_ends(2015, 8)
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let mut r = RawFundamentalRecord::new(date, 1.0, 0.0);
                r.dividends = 2f64.powi(i as i32);
                r.closing_price = 10.0;
                r.dividend_yield = [0.1; 5];
                r
            })
            .collect();
        let normalized = FundamentalNormalizer::default()
            .normalize(&raw, &FactorTable::empty(), &AdjustedDividendSeries::default())
            .unwrap();
        let growth = GrowthEngine::default().compute_growth(&normalized);
        for years in [1, 2] {
            match latest(&growth, TrackedFundamental::Dividends, years) {
                GrowthRate::Value(rate) => assert_relative_eq!(rate, 1.0, epsilon = 1e-9),
                other => panic!("expected estimate, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_failed_fit_uses_fallback_rate() {
        // A zero in the window has no logarithm.
        let values: Vec<f64> = (0..8).map(f64::from).collect();
        let growth = GrowthEngine::default().compute_growth(&series(&values));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 2), GrowthRate::Value(1.0));
        assert!(matches!(
            latest(&growth, TrackedFundamental::Revenue, 1),
            GrowthRate::Value(rate) if rate.is_finite() && rate != 1.0
        ));
    }

    #[test]
    fn test_negative_slack_leaves_window_non_empty() {
        let engine = GrowthEngine::new(GrowthConfig {
            slack_days: -400,
            ..GrowthConfig::default()
        });
        let growth = engine.compute_growth(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 1), GrowthRate::Insufficient);
    }

    #[test]
    fn test_average_excludes_shortest_window() {
        let q = 1.1f64.powf(0.25);
        let values: Vec<f64> = (0..8).map(|i| 100.0 * q.powi(i)).collect();
        let growth = GrowthEngine::default().compute_growth(&series(&values));
        let row = growth.latest(TrackedFundamental::Revenue).unwrap();
        // Windows 2, 4, 8: one estimate of 0.1 and two insufficient zeros.
        assert_relative_eq!(row.average, 0.1 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_window_includes_slack_days() {
        // A report ten days before the one-year boundary still counts.
        let dates = [d(2020, 12, 22), d(2021, 3, 31), d(2021, 6, 30), d(2021, 12, 31)];
        let engine = GrowthEngine::default();
        let raw: Vec<RawFundamentalRecord> = dates
            .iter()
            .map(|date| {
                let mut r = RawFundamentalRecord::new(*date, 1.0, 0.0);
                r.revenue = 5.0;
                r
            })
            .collect();
        let normalized = FundamentalNormalizer::default()
            .normalize(&raw, &FactorTable::empty(), &AdjustedDividendSeries::default())
            .unwrap();
        let growth = engine.compute_growth(&normalized);
        assert_eq!(latest(&growth, TrackedFundamental::Revenue, 1), GrowthRate::Value(0.0));
    }

    #[test]
    fn test_to_frame() {
        let growth = GrowthEngine::default().compute_growth(&series(&[1.0, 2.0, 3.0, 4.0]));
        let df = growth.to_frame().unwrap();
        assert_eq!(df.height(), 4 * TrackedFundamental::ALL.len());
        assert!(df.column("growth_8y").is_ok());
        assert!(df.column("growth_average").is_ok());
    }
}
