//! Daily valuation multiples.
//!
//! Every trading day with a fundamental snapshot gets two rows: one where flow
//! items (revenue, EBITDA, EBIT, earnings, cash flows) are the latest quarter
//! annualized, and one where they are the trailing twelve months. Balance items
//! always come from the latest snapshot. All ratios use the zero-guard rule of
//! [`ratio`].

use lastro_adjust::{AdjustedPrice, AdjustedPriceSeries, NormalizedFundamental, NormalizedFundamentalSeries};
use lastro_traits::frame::{date_column, float_column};
use lastro_traits::stats::{mean, ratio};
use lastro_traits::{DIVIDEND_HORIZONS, Date, Result, ToFrame};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which flow basis a multiples series uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplesVariant {
    /// Latest quarter's flows times the annualization factor.
    Quarterly,
    /// Sum of the trailing quarters' flows.
    Annual,
}

impl MultiplesVariant {
    /// Short label used in file names and logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

/// Configuration for the multiples engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplesConfig {
    /// Quarters summed for the trailing-twelve-month variant (default: 4).
    pub ttm_quarters: usize,

    /// Multiplier applied to a single quarter's flows (default: 4.0).
    pub annualization: f64,
}

impl Default for MultiplesConfig {
    fn default() -> Self {
        Self {
            ttm_quarters: 4,
            annualization: 4.0,
        }
    }
}

/// Multiples for one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplesRow {
    /// Trading date.
    pub date: Date,
    /// Report date of the snapshot used.
    pub report_date: Date,
    /// Equivalent shares in today's basis.
    pub equivalent_shares: f64,
    /// Close in today's share basis.
    pub equivalent_close: f64,
    /// Vendor-adjusted close.
    pub adjusted_close: f64,
    /// Market value.
    pub market_value: f64,
    /// Price plus net debt per share.
    pub enterprise_value: f64,
    /// Enterprise value including lease debt.
    pub enterprise_value_with_leases: f64,
    /// Price / book equity.
    pub price_to_book: f64,
    /// Price / revenue.
    pub price_to_sales: f64,
    /// EV / EBITDA.
    pub ev_to_ebitda: f64,
    /// EV including leases / EBITDA.
    pub ev_with_leases_to_ebitda: f64,
    /// Price / EBIT.
    pub price_to_ebit: f64,
    /// Price / net income.
    pub price_to_earnings: f64,
    /// Price / controlling net income.
    pub price_to_earnings_controlling: f64,
    /// Price / operating cash flow.
    pub price_to_operating_cash_flow: f64,
    /// Price / investing cash flow.
    pub price_to_investing_cash_flow: f64,
    /// Price / financing cash flow.
    pub price_to_financing_cash_flow: f64,
    /// Net income / equity.
    pub return_on_equity: f64,
    /// Net income / revenue.
    pub net_margin: f64,
    /// EBITDA / revenue.
    pub ebitda_margin: f64,
    /// Gross debt / equity.
    pub gross_debt_to_equity: f64,
    /// Net debt / EBITDA.
    pub net_debt_to_ebitda: f64,
    /// (Net debt + lease debt) / EBITDA.
    pub lease_adjusted_debt_to_ebitda: f64,
    /// Annualized dividend yield over the trailing 1..=5 years.
    pub dividend_yield: [f64; DIVIDEND_HORIZONS],
    /// Mean of the 2..=5-year yields.
    pub average_dividend_yield: f64,
}

/// One multiples variant for one instrument, ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplesSeries {
    variant: MultiplesVariant,
    rows: Vec<MultiplesRow>,
}

impl MultiplesSeries {
    /// Flow basis of this series.
    pub const fn variant(&self) -> MultiplesVariant {
        self.variant
    }

    /// Rows in ascending date order.
    pub fn rows(&self) -> &[MultiplesRow] {
        &self.rows
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The most recent row.
    pub fn last(&self) -> Option<&MultiplesRow> {
        self.rows.last()
    }

    /// The row for `date`, if it traded.
    pub fn get(&self, date: Date) -> Option<&MultiplesRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Flow items over some horizon, per equivalent share.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Flows {
    revenue: f64,
    ebitda: f64,
    ebit: f64,
    net_income: f64,
    net_income_controlling: f64,
    operating_cash_flow: f64,
    investing_cash_flow: f64,
    financing_cash_flow: f64,
}

impl Flows {
    fn of(row: &NormalizedFundamental) -> Self {
        Self {
            revenue: row.revenue,
            ebitda: row.ebitda,
            ebit: row.ebit,
            net_income: row.net_income,
            net_income_controlling: row.net_income_controlling,
            operating_cash_flow: row.operating_cash_flow,
            investing_cash_flow: row.investing_cash_flow,
            financing_cash_flow: row.financing_cash_flow,
        }
    }

    fn sum(rows: &[NormalizedFundamental]) -> Self {
        rows.iter().map(Self::of).fold(Self::default(), |acc, f| Self {
            revenue: acc.revenue + f.revenue,
            ebitda: acc.ebitda + f.ebitda,
            ebit: acc.ebit + f.ebit,
            net_income: acc.net_income + f.net_income,
            net_income_controlling: acc.net_income_controlling + f.net_income_controlling,
            operating_cash_flow: acc.operating_cash_flow + f.operating_cash_flow,
            investing_cash_flow: acc.investing_cash_flow + f.investing_cash_flow,
            financing_cash_flow: acc.financing_cash_flow + f.financing_cash_flow,
        })
    }

    fn scaled(self, k: f64) -> Self {
        Self {
            revenue: self.revenue * k,
            ebitda: self.ebitda * k,
            ebit: self.ebit * k,
            net_income: self.net_income * k,
            net_income_controlling: self.net_income_controlling * k,
            operating_cash_flow: self.operating_cash_flow * k,
            investing_cash_flow: self.investing_cash_flow * k,
            financing_cash_flow: self.financing_cash_flow * k,
        }
    }
}

/// Annualized trailing dividend yields and their smoothed average.
///
/// The one-year yield is reported but left out of the average, which is less
/// sensitive to a single unusual payment.
fn dividend_yields(latest: &NormalizedFundamental, price: f64) -> ([f64; DIVIDEND_HORIZONS], f64) {
    let yields: [f64; DIVIDEND_HORIZONS] = std::array::from_fn(|h| {
        ratio(latest.trailing_dividends[h] / (h + 1) as f64, price)
    });
    let average = mean(&yields[1..]).unwrap_or(0.0);
    (yields, average)
}

fn build_row(price: &AdjustedPrice, latest: &NormalizedFundamental, flows: Flows) -> MultiplesRow {
    let p = price.equivalent_close;
    let enterprise_value = p + latest.net_debt;
    let enterprise_value_with_leases = enterprise_value + latest.lease_debt;
    let (dividend_yield, average_dividend_yield) = dividend_yields(latest, p);

    MultiplesRow {
        date: price.date,
        report_date: latest.report_date,
        equivalent_shares: price.equivalent_shares,
        equivalent_close: p,
        adjusted_close: price.adjusted_close,
        market_value: price.market_value,
        enterprise_value,
        enterprise_value_with_leases,
        price_to_book: ratio(p, latest.equity),
        price_to_sales: ratio(p, flows.revenue),
        ev_to_ebitda: ratio(enterprise_value, flows.ebitda),
        ev_with_leases_to_ebitda: ratio(enterprise_value_with_leases, flows.ebitda),
        price_to_ebit: ratio(p, flows.ebit),
        price_to_earnings: ratio(p, flows.net_income),
        price_to_earnings_controlling: ratio(p, flows.net_income_controlling),
        price_to_operating_cash_flow: ratio(p, flows.operating_cash_flow),
        price_to_investing_cash_flow: ratio(p, flows.investing_cash_flow),
        price_to_financing_cash_flow: ratio(p, flows.financing_cash_flow),
        return_on_equity: ratio(flows.net_income, latest.equity),
        net_margin: ratio(flows.net_income, flows.revenue),
        ebitda_margin: ratio(flows.ebitda, flows.revenue),
        gross_debt_to_equity: ratio(latest.gross_debt, latest.equity),
        net_debt_to_ebitda: ratio(latest.net_debt, flows.ebitda),
        lease_adjusted_debt_to_ebitda: ratio(latest.net_debt + latest.lease_debt, flows.ebitda),
        dividend_yield,
        average_dividend_yield,
    }
}

/// Computes the quarterly-annualized and trailing-twelve-month multiples.
#[derive(Debug, Clone, Default)]
pub struct MultiplesEngine {
    config: MultiplesConfig,
}

impl MultiplesEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub const fn new(config: MultiplesConfig) -> Self {
        Self { config }
    }

    /// Returns `(quarterly, annual)` multiples for every trading day that has
    /// a snapshot on or before it. Days without one are excluded.
    pub fn compute(
        &self,
        normalized: &NormalizedFundamentalSeries,
        prices: &AdjustedPriceSeries,
    ) -> (MultiplesSeries, MultiplesSeries) {
        let reports = normalized.rows();
        let window = self.config.ttm_quarters.max(1);

        let mut quarterly = Vec::with_capacity(prices.len());
        let mut annual = Vec::with_capacity(prices.len());
        for price in prices.rows() {
            let Some(idx) = normalized.as_of_index(price.date) else {
                continue;
            };
            let latest = &reports[idx];
            let trailing = &reports[(idx + 1).saturating_sub(window)..=idx];

            quarterly.push(build_row(
                price,
                latest,
                Flows::of(latest).scaled(self.config.annualization),
            ));
            annual.push(build_row(price, latest, Flows::sum(trailing)));
        }

        debug!(days = annual.len(), "computed daily multiples");
        (
            MultiplesSeries {
                variant: MultiplesVariant::Quarterly,
                rows: quarterly,
            },
            MultiplesSeries {
                variant: MultiplesVariant::Annual,
                rows: annual,
            },
        )
    }
}

impl ToFrame for MultiplesSeries {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let f = |name: &str, get: fn(&MultiplesRow) -> f64| float_column(name, rows.iter().map(get));

        let mut columns = vec![
            date_column("date", rows.iter().map(|r| r.date))?,
            date_column("report_date", rows.iter().map(|r| r.report_date))?,
            f("equivalent_shares", |r| r.equivalent_shares),
            f("equivalent_close", |r| r.equivalent_close),
            f("adjusted_close", |r| r.adjusted_close),
            f("market_value", |r| r.market_value),
            f("enterprise_value", |r| r.enterprise_value),
            f("enterprise_value_with_leases", |r| r.enterprise_value_with_leases),
            f("price_to_book", |r| r.price_to_book),
            f("price_to_sales", |r| r.price_to_sales),
            f("ev_to_ebitda", |r| r.ev_to_ebitda),
            f("ev_with_leases_to_ebitda", |r| r.ev_with_leases_to_ebitda),
            f("price_to_ebit", |r| r.price_to_ebit),
            f("price_to_earnings", |r| r.price_to_earnings),
            f("price_to_earnings_controlling", |r| r.price_to_earnings_controlling),
            f("price_to_operating_cash_flow", |r| r.price_to_operating_cash_flow),
            f("price_to_investing_cash_flow", |r| r.price_to_investing_cash_flow),
            f("price_to_financing_cash_flow", |r| r.price_to_financing_cash_flow),
            f("return_on_equity", |r| r.return_on_equity),
            f("net_margin", |r| r.net_margin),
            f("ebitda_margin", |r| r.ebitda_margin),
            f("gross_debt_to_equity", |r| r.gross_debt_to_equity),
            f("net_debt_to_ebitda", |r| r.net_debt_to_ebitda),
            f("lease_adjusted_debt_to_ebitda", |r| r.lease_adjusted_debt_to_ebitda),
        ];
        for h in 0..DIVIDEND_HORIZONS {
            columns.push(float_column(
                &format!("dividend_yield_{}y", h + 1),
                rows.iter().map(|r| r.dividend_yield[h]),
            ));
        }
        columns.push(f("average_dividend_yield", |r| r.average_dividend_yield));

        Ok(DataFrame::new(columns)?)
    }
}
