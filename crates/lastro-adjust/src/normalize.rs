//! Per-equivalent-share fundamentals.
//!
//! Raw quarterly reports carry company totals and a share count in the share
//! basis of their own date. Normalization expresses every report in today's
//! basis: the equivalent share count is divided by the backward factor of the
//! report date, trailing dividends per share are multiplied by it, and each
//! monetary line is divided by the adjusted count.

use crate::dividends::{AdjustedDividendSeries, DEFAULT_INTEREST_ON_EQUITY_WITHHOLDING};
use crate::events::FactorTable;
use lastro_traits::frame::{date_column, float_column};
use lastro_traits::{DIVIDEND_HORIZONS, Date, LastroError, RawFundamentalRecord, Result, ToFrame};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where trailing dividends per share come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendSource {
    /// Reported trailing yield times the report's closing price.
    #[default]
    ReportedYield,
    /// Sum of adjusted payments in the trailing window ending at the report date.
    PaymentHistory,
}

/// Configuration for fundamental normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Source of trailing dividends per share (default: reported yields).
    pub dividend_source: DividendSource,

    /// Withholding applied to interest-on-equity payments (default: 0.15).
    pub interest_on_equity_withholding: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dividend_source: DividendSource::ReportedYield,
            interest_on_equity_withholding: DEFAULT_INTEREST_ON_EQUITY_WITHHOLDING,
        }
    }
}

/// One quarterly report in today's share basis.
///
/// Monetary lines are per equivalent share; `market_value`, `closing_price`
/// and `payout` are carried as reported.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFundamental {
    /// Balance sheet date.
    pub report_date: Date,
    /// Shares outstanding as reported.
    pub shares_outstanding: f64,
    /// Equivalence factor as reported.
    pub equivalence_factor: f64,
    /// `shares_outstanding / equivalence_factor`, in the report's own basis.
    pub unadjusted_equivalent_shares: f64,
    /// Equivalent shares in today's basis.
    pub equivalent_shares: f64,
    /// Company market value as reported.
    pub market_value: f64,
    /// Book equity per share.
    pub equity: f64,
    /// Quarterly revenue per share.
    pub revenue: f64,
    /// Quarterly EBITDA per share.
    pub ebitda: f64,
    /// Depreciation and amortization per share.
    pub depreciation_amortization: f64,
    /// Quarterly EBIT per share.
    pub ebit: f64,
    /// Net income per share.
    pub net_income: f64,
    /// Controlling net income per share.
    pub net_income_controlling: f64,
    /// Minority net income per share.
    pub net_income_minority: f64,
    /// Gross debt per share.
    pub gross_debt: f64,
    /// Net debt per share.
    pub net_debt: f64,
    /// Lease debt per share.
    pub lease_debt: f64,
    /// Operating cash flow per share.
    pub operating_cash_flow: f64,
    /// Investing cash flow per share.
    pub investing_cash_flow: f64,
    /// Financing cash flow per share.
    pub financing_cash_flow: f64,
    /// Dividends paid in the quarter per share.
    pub dividends: f64,
    /// Interest on equity paid in the quarter per share.
    pub interest_on_equity: f64,
    /// Unadjusted closing price on the report date.
    pub closing_price: f64,
    /// Payout ratio as reported.
    pub payout: f64,
    /// Cumulative dividends per share over the trailing 1..=5 years.
    pub trailing_dividends: [f64; DIVIDEND_HORIZONS],
}

/// Normalized fundamentals of one instrument, ascending by report date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFundamentalSeries {
    rows: Vec<NormalizedFundamental>,
}

impl NormalizedFundamentalSeries {
    /// Rows in ascending report-date order.
    pub fn rows(&self) -> &[NormalizedFundamental] {
        &self.rows
    }

    /// Number of reports.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no reports.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Date of the oldest report.
    pub fn first_date(&self) -> Option<Date> {
        self.rows.first().map(|r| r.report_date)
    }

    /// Index of the latest report dated on or before `date`.
    pub fn as_of_index(&self, date: Date) -> Option<usize> {
        self.rows
            .partition_point(|r| r.report_date <= date)
            .checked_sub(1)
    }

    /// Latest report dated on or before `date`.
    pub fn as_of(&self, date: Date) -> Option<&NormalizedFundamental> {
        self.as_of_index(date).map(|i| &self.rows[i])
    }
}

/// Converts raw shares into the instrument's equivalent share count.
///
/// Zero or non-finite inputs are integrity errors: every per-share figure
/// downstream would be meaningless.
pub fn equivalent_shares(date: Date, shares: f64, equivalence_factor: f64) -> Result<f64> {
    if !shares.is_finite() || shares == 0.0 {
        return Err(LastroError::integrity(
            date,
            format!("unusable share count {shares}"),
        ));
    }
    if !equivalence_factor.is_finite() || equivalence_factor == 0.0 {
        return Err(LastroError::integrity(
            date,
            format!("unusable equivalence factor {equivalence_factor}"),
        ));
    }
    Ok(shares / equivalence_factor)
}

/// Converts raw reports into per-equivalent-share fundamentals.
#[derive(Debug, Clone, Default)]
pub struct FundamentalNormalizer {
    config: NormalizerConfig,
}

impl FundamentalNormalizer {
    /// Create a normalizer with the given configuration.
    #[must_use]
    pub const fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalizes `raw` using the instrument's event factors and adjusted
    /// dividend history.
    ///
    /// Input order does not matter; output is ascending by report date and a
    /// duplicated report date keeps the last record given.
    ///
    /// # Errors
    ///
    /// [`LastroError::DataIntegrity`] if any record has a zero share count or
    /// zero equivalence factor.
    pub fn normalize(
        &self,
        raw: &[RawFundamentalRecord],
        factors: &FactorTable,
        dividends: &AdjustedDividendSeries,
    ) -> Result<NormalizedFundamentalSeries> {
        let mut ordered: Vec<&RawFundamentalRecord> = raw.iter().collect();
        ordered.sort_by_key(|r| r.report_date);

        let mut rows: Vec<NormalizedFundamental> = Vec::with_capacity(ordered.len());
        for record in ordered {
            let row = self.normalize_record(record, factors, dividends)?;
            match rows.last_mut() {
                Some(last) if last.report_date == row.report_date => {
                    warn!(date = %row.report_date, "duplicate report date, keeping the later record");
                    *last = row;
                }
                _ => rows.push(row),
            }
        }

        debug!(
            reports = rows.len(),
            events = factors.len(),
            "normalized fundamentals"
        );
        Ok(NormalizedFundamentalSeries { rows })
    }

    fn normalize_record(
        &self,
        record: &RawFundamentalRecord,
        factors: &FactorTable,
        dividends: &AdjustedDividendSeries,
    ) -> Result<NormalizedFundamental> {
        let date = record.report_date;
        let unadjusted =
            equivalent_shares(date, record.shares_outstanding, record.equivalence_factor)?;

        let factor = factors.cumulative_factor(date);
        let shares = unadjusted / factor;

        let trailing_dividends: [f64; DIVIDEND_HORIZONS] = match self.config.dividend_source {
            DividendSource::ReportedYield => std::array::from_fn(|h| {
                record.dividend_yield[h] * record.closing_price * factor
            }),
            DividendSource::PaymentHistory => {
                std::array::from_fn(|h| dividends.trailing_sum(date, h as u32 + 1))
            }
        };

        let per_share = |value: f64| value / shares;
        Ok(NormalizedFundamental {
            report_date: date,
            shares_outstanding: record.shares_outstanding,
            equivalence_factor: record.equivalence_factor,
            unadjusted_equivalent_shares: unadjusted,
            equivalent_shares: shares,
            market_value: record.market_value,
            equity: per_share(record.equity),
            revenue: per_share(record.revenue),
            ebitda: per_share(record.ebitda),
            depreciation_amortization: per_share(record.depreciation_amortization),
            ebit: per_share(record.ebit),
            net_income: per_share(record.net_income),
            net_income_controlling: per_share(record.net_income_controlling),
            net_income_minority: per_share(record.net_income_minority),
            gross_debt: per_share(record.gross_debt),
            net_debt: per_share(record.net_debt),
            lease_debt: per_share(record.lease_debt),
            operating_cash_flow: per_share(record.operating_cash_flow),
            investing_cash_flow: per_share(record.investing_cash_flow),
            financing_cash_flow: per_share(record.financing_cash_flow),
            dividends: per_share(record.dividends),
            interest_on_equity: per_share(record.interest_on_equity),
            closing_price: record.closing_price,
            payout: record.payout,
            trailing_dividends,
        })
    }
}

impl ToFrame for NormalizedFundamentalSeries {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let f = |name: &str, get: fn(&NormalizedFundamental) -> f64| {
            float_column(name, rows.iter().map(get))
        };

        let mut columns = vec![
            date_column("report_date", rows.iter().map(|r| r.report_date))?,
            f("shares_outstanding", |r| r.shares_outstanding),
            f("equivalence_factor", |r| r.equivalence_factor),
            f("unadjusted_equivalent_shares", |r| r.unadjusted_equivalent_shares),
            f("equivalent_shares", |r| r.equivalent_shares),
            f("market_value", |r| r.market_value),
            f("equity", |r| r.equity),
            f("revenue", |r| r.revenue),
            f("ebitda", |r| r.ebitda),
            f("depreciation_amortization", |r| r.depreciation_amortization),
            f("ebit", |r| r.ebit),
            f("net_income", |r| r.net_income),
            f("net_income_controlling", |r| r.net_income_controlling),
            f("net_income_minority", |r| r.net_income_minority),
            f("gross_debt", |r| r.gross_debt),
            f("net_debt", |r| r.net_debt),
            f("lease_debt", |r| r.lease_debt),
            f("operating_cash_flow", |r| r.operating_cash_flow),
            f("investing_cash_flow", |r| r.investing_cash_flow),
            f("financing_cash_flow", |r| r.financing_cash_flow),
            f("dividends", |r| r.dividends),
            f("interest_on_equity", |r| r.interest_on_equity),
            f("closing_price", |r| r.closing_price),
            f("payout", |r| r.payout),
        ];
        for h in 0..DIVIDEND_HORIZONS {
            columns.push(float_column(
                &format!("trailing_dividends_{}y", h + 1),
                rows.iter().map(|r| r.trailing_dividends[h]),
            ));
        }

        Ok(DataFrame::new(columns)?)
    }
}
