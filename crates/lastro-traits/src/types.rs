//! Raw input records consumed by the engine.
//!
//! These are the typed rows the ingestion layer produces from the per-ticker
//! tables. Monetary figures are absolute company totals; dividend yields are
//! fractions (0.05 for 5%).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A ticker symbol such as `"PETR4"`.
pub type Symbol = String;

/// Number of trailing dividend horizons carried through the engine (1..=5 years).
pub const DIVIDEND_HORIZONS: usize = 5;

/// Share class of a listed instrument.
///
/// Corporate actions and dividends may target a single class; an event with
/// no class applies to every class of the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareClass {
    /// Common shares (ticker suffix 3).
    On,
    /// Preferred shares (suffix 4).
    Pn,
    /// Preferred class A (suffix 5).
    Pna,
    /// Preferred class B (suffix 6).
    Pnb,
    /// Units bundling several classes (suffix 11).
    Unit,
}

impl ShareClass {
    /// Infers the share class from a B3-style ticker (`PETR4`, `TAEE11`).
    ///
    /// Returns `None` when the suffix is not recognised; such instruments only
    /// match events and dividends that apply to all classes.
    pub fn from_ticker(ticker: &str) -> Option<Self> {
        let suffix = ticker.get(4..)?;
        if suffix.starts_with("11") {
            return Some(Self::Unit);
        }
        match suffix.chars().next()? {
            '3' => Some(Self::On),
            '4' => Some(Self::Pn),
            '5' => Some(Self::Pna),
            '6' => Some(Self::Pnb),
            _ => None,
        }
    }

    /// Label used in the source tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Pn => "PN",
            Self::Pna => "PNA",
            Self::Pnb => "PNB",
            Self::Unit => "UNT",
        }
    }

    /// Parses a class label from a source table.
    ///
    /// `Ok(None)` means "all classes" (`todas`, `all` or blank).
    pub fn parse_label(label: &str) -> Result<Option<Self>, String> {
        match label.trim().to_ascii_uppercase().as_str() {
            "" | "TODAS" | "ALL" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for ShareClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "PN" => Ok(Self::Pn),
            "PNA" => Ok(Self::Pna),
            "PNB" => Ok(Self::Pnb),
            "UNT" | "UNIT" => Ok(Self::Unit),
            other => Err(format!("unknown share class '{other}'")),
        }
    }
}

impl fmt::Display for ShareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The date `years` calendar years before `date`.
///
/// Month-end dates are clamped (2024-02-29 minus one year is 2023-02-28).
/// Saturates at the minimum representable date.
pub fn years_before(date: Date, years: u32) -> Date {
    date.checked_sub_months(chrono::Months::new(years.saturating_mul(12)))
        .unwrap_or(Date::MIN)
}

/// Whether an item targeting `target` applies to an instrument of `class`.
pub fn class_matches(target: Option<ShareClass>, class: Option<ShareClass>) -> bool {
    match target {
        None => true,
        Some(t) => class == Some(t),
    }
}

/// One quarterly fundamental report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFundamentalRecord {
    /// Balance sheet date of the report.
    pub report_date: Date,
    /// Shares outstanding across all classes.
    pub shares_outstanding: f64,
    /// Shares per tradeable unit of this instrument (1 for plain shares).
    pub equivalence_factor: f64,
    /// Company market value reported alongside the fundamentals.
    pub market_value: f64,
    /// Book equity.
    pub equity: f64,
    /// Net revenue for the quarter.
    pub revenue: f64,
    /// EBITDA for the quarter.
    pub ebitda: f64,
    /// Depreciation and amortization.
    pub depreciation_amortization: f64,
    /// EBIT for the quarter.
    pub ebit: f64,
    /// Net income, total.
    pub net_income: f64,
    /// Net income attributable to controlling shareholders.
    pub net_income_controlling: f64,
    /// Net income attributable to minority holders.
    pub net_income_minority: f64,
    /// Gross debt.
    pub gross_debt: f64,
    /// Net debt.
    pub net_debt: f64,
    /// Lease liabilities.
    pub lease_debt: f64,
    /// Operating cash flow.
    pub operating_cash_flow: f64,
    /// Investing cash flow.
    pub investing_cash_flow: f64,
    /// Financing cash flow.
    pub financing_cash_flow: f64,
    /// Unadjusted closing price on the report date.
    pub closing_price: f64,
    /// Total dividends paid in the quarter.
    pub dividends: f64,
    /// Interest on equity paid in the quarter.
    pub interest_on_equity: f64,
    /// Payout ratio as reported.
    pub payout: f64,
    /// Trailing dividend yields at 12/24/36/48/60 months, as fractions.
    pub dividend_yield: [f64; DIVIDEND_HORIZONS],
}

impl RawFundamentalRecord {
    /// Creates a record with the mandatory fields set and every line item zero.
    pub const fn new(report_date: Date, shares_outstanding: f64, market_value: f64) -> Self {
        Self {
            report_date,
            shares_outstanding,
            equivalence_factor: 1.0,
            market_value,
            equity: 0.0,
            revenue: 0.0,
            ebitda: 0.0,
            depreciation_amortization: 0.0,
            ebit: 0.0,
            net_income: 0.0,
            net_income_controlling: 0.0,
            net_income_minority: 0.0,
            gross_debt: 0.0,
            net_debt: 0.0,
            lease_debt: 0.0,
            operating_cash_flow: 0.0,
            investing_cash_flow: 0.0,
            financing_cash_flow: 0.0,
            closing_price: 0.0,
            dividends: 0.0,
            interest_on_equity: 0.0,
            payout: 0.0,
            dividend_yield: [0.0; DIVIDEND_HORIZONS],
        }
    }
}

/// A split, reverse split or bonus issue.
///
/// `factor` multiplies per-share prices: a 2-for-1 split carries 0.5, a
/// 1-for-10 grouping carries 10. A missing factor is treated as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateActionEvent {
    /// Last date trading with the old share basis ("data com").
    pub date: Date,
    /// Price multiplier, if the source provided a usable one.
    pub factor: Option<f64>,
    /// Target class; `None` applies to all classes.
    pub share_class: Option<ShareClass>,
}

impl CorporateActionEvent {
    /// Event applying to all share classes.
    pub const fn new(date: Date, factor: f64) -> Self {
        Self {
            date,
            factor: Some(factor),
            share_class: None,
        }
    }

    /// Whether this event touches an instrument of `class`.
    pub fn applies_to(&self, class: Option<ShareClass>) -> bool {
        class_matches(self.share_class, class)
    }
}

/// One trading day of quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Trading date.
    pub date: Date,
    /// Historical (unadjusted) close.
    pub raw_close: f64,
    /// Vendor-adjusted close.
    pub adjusted_close: f64,
    /// Adjusted open.
    pub adjusted_open: f64,
    /// Adjusted high.
    pub adjusted_high: f64,
    /// Adjusted low.
    pub adjusted_low: f64,
    /// Adjusted average price.
    pub adjusted_mean: f64,
    /// Traded volume.
    pub volume: f64,
    /// Number of trades.
    pub trades: f64,
}

impl PriceRecord {
    /// A quote where every adjusted field equals `adjusted_close`.
    pub const fn close_only(date: Date, raw_close: f64, adjusted_close: f64) -> Self {
        Self {
            date,
            raw_close,
            adjusted_close,
            adjusted_open: adjusted_close,
            adjusted_high: adjusted_close,
            adjusted_low: adjusted_close,
            adjusted_mean: adjusted_close,
            volume: 0.0,
            trades: 0.0,
        }
    }
}

/// Kind of shareholder payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividendKind {
    /// Ordinary dividend.
    Ordinary,
    /// Interest on equity (JCP), subject to withholding tax.
    InterestOnEquity,
}

impl DividendKind {
    /// Parses the payment type label used in source tables.
    pub fn parse_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "JCP" | "JUROS SOBRE CAPITAL PROPRIO" | "INTEREST_ON_EQUITY" => Self::InterestOnEquity,
            _ => Self::Ordinary,
        }
    }
}

/// One dividend payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Ex-dividend date.
    pub ex_date: Date,
    /// Gross amount per share.
    pub amount: f64,
    /// Payment type.
    pub kind: DividendKind,
    /// Target class; `None` applies to all classes.
    pub share_class: Option<ShareClass>,
}

impl DividendRecord {
    /// Whether this payment belongs to an instrument of `class`.
    pub fn applies_to(&self, class: Option<ShareClass>) -> bool {
        class_matches(self.share_class, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_class_from_ticker() {
        assert_eq!(ShareClass::from_ticker("PETR3"), Some(ShareClass::On));
        assert_eq!(ShareClass::from_ticker("PETR4"), Some(ShareClass::Pn));
        assert_eq!(ShareClass::from_ticker("USIM5"), Some(ShareClass::Pna));
        assert_eq!(ShareClass::from_ticker("ELET6"), Some(ShareClass::Pnb));
        assert_eq!(ShareClass::from_ticker("TAEE11"), Some(ShareClass::Unit));
        assert_eq!(ShareClass::from_ticker("ABCD9"), None);
        assert_eq!(ShareClass::from_ticker("AB"), None);
    }

    #[test]
    fn test_share_class_labels() {
        assert_eq!(ShareClass::parse_label("todas"), Ok(None));
        assert_eq!(ShareClass::parse_label("PN"), Ok(Some(ShareClass::Pn)));
        assert_eq!(ShareClass::parse_label(" unt "), Ok(Some(ShareClass::Unit)));
        assert!(ShareClass::parse_label("XYZ").is_err());
        assert_eq!(ShareClass::Pnb.to_string(), "PNB");
    }

    #[test]
    fn test_years_before() {
        let leap = Date::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(years_before(leap, 1), Date::from_ymd_opt(2023, 2, 28).unwrap());
        let q = Date::from_ymd_opt(2023, 6, 30).unwrap();
        assert_eq!(years_before(q, 2), Date::from_ymd_opt(2021, 6, 30).unwrap());
        assert_eq!(years_before(q, 0), q);
    }

    #[test]
    fn test_event_applies_to() {
        let date = Date::from_ymd_opt(2022, 5, 2).unwrap();
        let all = CorporateActionEvent::new(date, 0.5);
        assert!(all.applies_to(Some(ShareClass::On)));
        assert!(all.applies_to(None));

        let pn_only = CorporateActionEvent {
            share_class: Some(ShareClass::Pn),
            ..all
        };
        assert!(pn_only.applies_to(Some(ShareClass::Pn)));
        assert!(!pn_only.applies_to(Some(ShareClass::On)));
        assert!(!pn_only.applies_to(None));
    }

    #[test]
    fn test_dividend_kind_labels() {
        assert_eq!(DividendKind::parse_label("JCP"), DividendKind::InterestOnEquity);
        assert_eq!(DividendKind::parse_label("Dividendo"), DividendKind::Ordinary);
    }

    #[test]
    fn test_raw_record_defaults() {
        let date = Date::from_ymd_opt(2023, 3, 31).unwrap();
        let record = RawFundamentalRecord::new(date, 1_000.0, 50_000.0);
        assert_eq!(record.equivalence_factor, 1.0);
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.dividend_yield, [0.0; DIVIDEND_HORIZONS]);
    }
}
