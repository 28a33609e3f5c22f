//! Dividend payments expressed in today's share basis.

use crate::events::FactorTable;
use lastro_traits::frame::{date_column, float_column, str_column};
use lastro_traits::{
    Date, DividendKind, DividendRecord, Result, ShareClass, ToFrame, years_before,
};
use polars::prelude::*;
use tracing::debug;

/// Default withholding tax applied to interest on equity.
pub const DEFAULT_INTEREST_ON_EQUITY_WITHHOLDING: f64 = 0.15;

/// A dividend payment after withholding and corporate-action adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedDividend {
    /// Ex-dividend date.
    pub ex_date: Date,
    /// Payment type.
    pub kind: DividendKind,
    /// Gross amount per share as paid.
    pub amount: f64,
    /// Amount net of interest-on-equity withholding.
    pub effective_amount: f64,
    /// Effective amount in today's share basis.
    pub adjusted_amount: f64,
}

/// Adjusted dividend history of one instrument, ascending by ex-date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustedDividendSeries {
    rows: Vec<AdjustedDividend>,
}

impl AdjustedDividendSeries {
    /// Rows in ascending ex-date order.
    pub fn rows(&self) -> &[AdjustedDividend] {
        &self.rows
    }

    /// Number of payments.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the instrument paid nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of adjusted payments with ex-date in `(end - years, end]`.
    pub fn trailing_sum(&self, end: Date, years: u32) -> f64 {
        let start = years_before(end, years);
        let lo = self.rows.partition_point(|r| r.ex_date <= start);
        let hi = self.rows.partition_point(|r| r.ex_date <= end);
        self.rows[lo..hi.max(lo)]
            .iter()
            .map(|r| r.adjusted_amount)
            .sum()
    }
}

/// Applies withholding and backward event factors to the payments of `class`.
pub fn adjust_dividends(
    records: &[DividendRecord],
    factors: &FactorTable,
    class: Option<ShareClass>,
    interest_on_equity_withholding: f64,
) -> AdjustedDividendSeries {
    let mut rows: Vec<AdjustedDividend> = records
        .iter()
        .filter(|r| r.applies_to(class))
        .map(|r| {
            let effective_amount = match r.kind {
                DividendKind::InterestOnEquity => r.amount * (1.0 - interest_on_equity_withholding),
                DividendKind::Ordinary => r.amount,
            };
            AdjustedDividend {
                ex_date: r.ex_date,
                kind: r.kind,
                amount: r.amount,
                effective_amount,
                adjusted_amount: factors.adjust_dividend(effective_amount, r.ex_date),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.ex_date);

    debug!(payments = rows.len(), "adjusted dividend history");
    AdjustedDividendSeries { rows }
}

impl ToFrame for AdjustedDividendSeries {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let df = DataFrame::new(vec![
            date_column("ex_date", rows.iter().map(|r| r.ex_date))?,
            str_column(
                "kind",
                rows.iter().map(|r| match r.kind {
                    DividendKind::Ordinary => "ordinary",
                    DividendKind::InterestOnEquity => "interest_on_equity",
                }),
            ),
            float_column("amount", rows.iter().map(|r| r.amount)),
            float_column("effective_amount", rows.iter().map(|r| r.effective_amount)),
            float_column("adjusted_amount", rows.iter().map(|r| r.adjusted_amount)),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lastro_traits::CorporateActionEvent;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn payment(ex_date: Date, amount: f64, kind: DividendKind) -> DividendRecord {
        DividendRecord {
            ex_date,
            amount,
            kind,
            share_class: None,
        }
    }

    #[test]
    fn test_interest_on_equity_withholding() {
        let records = [
            payment(d(2023, 5, 2), 1.0, DividendKind::InterestOnEquity),
            payment(d(2023, 3, 1), 1.0, DividendKind::Ordinary),
        ];
        let series = adjust_dividends(&records, &FactorTable::empty(), None, 0.15);
        assert_eq!(series.len(), 2);
        // Sorted ascending.
        assert_eq!(series.rows()[0].kind, DividendKind::Ordinary);
        assert_relative_eq!(series.rows()[1].effective_amount, 0.85);
        assert_relative_eq!(series.rows()[1].adjusted_amount, 0.85);
    }

    #[test]
    fn test_split_adjusts_earlier_payments() {
        let events = [CorporateActionEvent::new(d(2023, 6, 1), 0.5)];
        let table = FactorTable::new(&events, None);
        let records = [
            payment(d(2023, 4, 1), 2.0, DividendKind::Ordinary),
            payment(d(2023, 9, 1), 1.0, DividendKind::Ordinary),
        ];
        let series = adjust_dividends(&records, &table, None, 0.15);
        assert_relative_eq!(series.rows()[0].adjusted_amount, 1.0);
        assert_relative_eq!(series.rows()[1].adjusted_amount, 1.0);
    }

    #[test]
    fn test_class_filter() {
        let records = [
            DividendRecord {
                share_class: Some(ShareClass::Pn),
                ..payment(d(2023, 4, 1), 2.0, DividendKind::Ordinary)
            },
            payment(d(2023, 5, 1), 1.0, DividendKind::Ordinary),
        ];
        let series = adjust_dividends(&records, &FactorTable::empty(), Some(ShareClass::On), 0.15);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_trailing_sum_window() {
        let records = [
            payment(d(2021, 12, 31), 5.0, DividendKind::Ordinary),
            payment(d(2022, 3, 31), 1.0, DividendKind::Ordinary),
            payment(d(2022, 9, 30), 2.0, DividendKind::Ordinary),
            payment(d(2023, 1, 15), 4.0, DividendKind::Ordinary),
        ];
        let series = adjust_dividends(&records, &FactorTable::empty(), None, 0.15);
        // (2021-12-31, 2022-12-31]
        assert_relative_eq!(series.trailing_sum(d(2022, 12, 31), 1), 3.0);
        assert_relative_eq!(series.trailing_sum(d(2022, 12, 31), 2), 8.0);
        assert_relative_eq!(series.trailing_sum(d(2020, 1, 1), 1), 0.0);
    }

    #[test]
    fn test_to_frame() {
        let records = [payment(d(2023, 4, 1), 2.0, DividendKind::Ordinary)];
        let df = adjust_dividends(&records, &FactorTable::empty(), None, 0.15)
            .to_frame()
            .unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column("adjusted_amount").is_ok());
    }
}
