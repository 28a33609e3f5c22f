//! Daily prices in the same share basis as the normalized fundamentals.

use crate::events::FactorTable;
use crate::normalize::NormalizedFundamentalSeries;
use lastro_traits::frame::{date_column, float_column};
use lastro_traits::{Date, PriceRecord, Result, ToFrame};
use polars::prelude::*;
use tracing::debug;

/// One trading day after corporate-action adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedPrice {
    /// Trading date.
    pub date: Date,
    /// Report date of the fundamental snapshot in effect on `date`.
    pub report_date: Date,
    /// Historical close as traded.
    pub raw_close: f64,
    /// Vendor-adjusted close, passed through.
    pub adjusted_close: f64,
    /// Historical close in today's share basis.
    pub equivalent_close: f64,
    /// Equivalent shares in today's share basis.
    pub equivalent_shares: f64,
    /// `equivalent_close * equivalent_shares`.
    pub market_value: f64,
}

/// Adjusted daily prices of one instrument, ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustedPriceSeries {
    rows: Vec<AdjustedPrice>,
}

impl AdjustedPriceSeries {
    /// Rows in ascending date order.
    pub fn rows(&self) -> &[AdjustedPrice] {
        &self.rows
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no trading day had a fundamental snapshot.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row for `date`, if it traded.
    pub fn get(&self, date: Date) -> Option<&AdjustedPrice> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// The most recent row.
    pub fn last(&self) -> Option<&AdjustedPrice> {
        self.rows.last()
    }
}

/// Joins quotes to fundamental snapshots and applies event factors.
///
/// Each trading day takes the equivalent share count of the latest report on
/// or before it (days before the first report are dropped). That count is
/// rolled forward through events between the report and the day, then both
/// price and shares are expressed in today's basis, so market value is
/// continuous across splits.
pub fn adjust_prices(
    prices: &[PriceRecord],
    normalized: &NormalizedFundamentalSeries,
    factors: &FactorTable,
) -> AdjustedPriceSeries {
    let mut ordered: Vec<&PriceRecord> = prices.iter().collect();
    ordered.sort_by_key(|p| p.date);

    let mut dropped = 0usize;
    let rows: Vec<AdjustedPrice> = ordered
        .into_iter()
        .filter_map(|quote| {
            let Some(snapshot) = normalized.as_of(quote.date) else {
                dropped += 1;
                return None;
            };

            // Snapshot basis -> trading-day basis -> today's basis.
            let day_shares = snapshot.unadjusted_equivalent_shares
                / factors.factor_between(snapshot.report_date, quote.date);
            let equivalent_shares = factors.adjust_shares(day_shares, quote.date);
            let equivalent_close = factors.adjust_price(quote.raw_close, quote.date);

            Some(AdjustedPrice {
                date: quote.date,
                report_date: snapshot.report_date,
                raw_close: quote.raw_close,
                adjusted_close: quote.adjusted_close,
                equivalent_close,
                equivalent_shares,
                market_value: equivalent_close * equivalent_shares,
            })
        })
        .collect();

    debug!(
        days = rows.len(),
        dropped, "adjusted prices against fundamental snapshots"
    );
    AdjustedPriceSeries { rows }
}

impl ToFrame for AdjustedPriceSeries {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let df = DataFrame::new(vec![
            date_column("date", rows.iter().map(|r| r.date))?,
            date_column("report_date", rows.iter().map(|r| r.report_date))?,
            float_column("raw_close", rows.iter().map(|r| r.raw_close)),
            float_column("adjusted_close", rows.iter().map(|r| r.adjusted_close)),
            float_column("equivalent_close", rows.iter().map(|r| r.equivalent_close)),
            float_column("equivalent_shares", rows.iter().map(|r| r.equivalent_shares)),
            float_column("market_value", rows.iter().map(|r| r.market_value)),
        ])?;
        Ok(df)
    }
}
