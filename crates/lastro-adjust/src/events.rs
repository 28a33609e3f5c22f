//! Backward adjustment factors from corporate actions.
//!
//! A [`FactorTable`] folds an instrument's splits, groupings and bonus issues
//! into suffix products, so the cumulative factor for any date is one binary
//! search away. The factor for date `d` is the product of every event dated on
//! or after `d`: per-share amounts are multiplied by it and share counts
//! divided by it, which expresses history in today's share basis.

use lastro_traits::{CorporateActionEvent, Date, ShareClass};
use tracing::warn;

/// Chronological table of composed event factors for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    /// Distinct event dates, ascending.
    dates: Vec<Date>,
    /// Composed factor of all events on `dates[i]`.
    factors: Vec<f64>,
    /// `suffix[i]` is the product of `factors[i..]`; `suffix[n] == 1.0`.
    suffix: Vec<f64>,
}

impl Default for FactorTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl FactorTable {
    /// Table with no events; every factor is 1.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            factors: Vec::new(),
            suffix: vec![1.0],
        }
    }

    /// Builds the table from the events that apply to `class`.
    ///
    /// Missing, non-finite or non-positive factors are replaced by the neutral
    /// 1.0 so one bad row cannot invalidate the whole history. Same-day events
    /// compose multiplicatively.
    pub fn new(events: &[CorporateActionEvent], class: Option<ShareClass>) -> Self {
        let mut resolved: Vec<(Date, f64)> = events
            .iter()
            .filter(|e| e.applies_to(class))
            .map(|e| (e.date, resolve_factor(e)))
            .collect();
        resolved.sort_by_key(|(date, _)| *date);

        let mut dates: Vec<Date> = Vec::with_capacity(resolved.len());
        let mut factors: Vec<f64> = Vec::with_capacity(resolved.len());
        for (date, factor) in resolved {
            match dates.last() {
                Some(last) if *last == date => {
                    if let Some(f) = factors.last_mut() {
                        *f *= factor;
                    }
                }
                _ => {
                    dates.push(date);
                    factors.push(factor);
                }
            }
        }

        let suffix = factors
            .iter()
            .rev()
            .fold(vec![1.0], |mut acc, f| {
                let next = acc[acc.len() - 1] * f;
                acc.push(next);
                acc
            })
            .into_iter()
            .rev()
            .collect();

        Self {
            dates,
            factors,
            suffix,
        }
    }

    /// Number of distinct event dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the instrument has no applicable events.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Event dates with their composed factors, ascending.
    pub fn events(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.factors.iter().copied())
    }

    /// Index of the first event dated on or after `date`.
    fn first_on_or_after(&self, date: Date) -> usize {
        self.dates.partition_point(|d| *d < date)
    }

    /// Cumulative backward factor for `as_of`: product of the factors of all
    /// events dated on or after it.
    pub fn cumulative_factor(&self, as_of: Date) -> f64 {
        self.suffix[self.first_on_or_after(as_of)]
    }

    /// Product of the factors of events dated in `[from, to)`.
    ///
    /// Rolls a quantity known in the share basis of `from` forward to the
    /// basis of `to`. Returns 1.0 when `to <= from`.
    pub fn factor_between(&self, from: Date, to: Date) -> f64 {
        if to <= from {
            return 1.0;
        }
        let start = self.first_on_or_after(from);
        let end = self.first_on_or_after(to);
        self.factors[start..end].iter().product()
    }

    /// Expresses a per-share price dated `date` in today's share basis.
    pub fn adjust_price(&self, price: f64, date: Date) -> f64 {
        price * self.cumulative_factor(date)
    }

    /// Expresses a per-share payment dated `date` in today's share basis.
    pub fn adjust_dividend(&self, amount: f64, date: Date) -> f64 {
        amount * self.cumulative_factor(date)
    }

    /// Expresses a share count dated `date` in today's share basis.
    pub fn adjust_shares(&self, shares: f64, date: Date) -> f64 {
        shares / self.cumulative_factor(date)
    }
}

/// Cumulative backward factor of `events` (all classes) at `as_of`.
///
/// Convenience for one-off lookups; build a [`FactorTable`] when adjusting a
/// whole series.
pub fn cumulative_factor(events: &[CorporateActionEvent], as_of: Date) -> f64 {
    FactorTable::new(events, None).cumulative_factor(as_of)
}

fn resolve_factor(event: &CorporateActionEvent) -> f64 {
    match event.factor {
        Some(f) if f.is_finite() && f > 0.0 => f,
        other => {
            warn!(date = %event.date, factor = ?other, "unusable corporate action factor, treating as neutral");
            1.0
        }
    }
}
