//! Corporate-action adjustment and per-share normalization.
//!
//! This crate owns the single share basis every lastro series is expressed in:
//! - [`events`]: backward adjustment factors from splits, groupings and bonus issues
//! - [`dividends`]: dividend payments net of withholding, in today's basis
//! - [`normalize`]: quarterly fundamentals per equivalent share
//! - [`prices`]: daily quotes joined to the fundamental snapshot in effect
//!
//! # Example
//!
//! ```ignore
//! use lastro_adjust::{adjust_dividends, adjust_prices, FactorTable, FundamentalNormalizer};
//!
//! let factors = FactorTable::new(&events, class);
//! let dividends = adjust_dividends(&payments, &factors, class, 0.15);
//! let normalized = FundamentalNormalizer::default().normalize(&raw, &factors, &dividends)?;
//! let prices = adjust_prices(&quotes, &normalized, &factors);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod dividends;
pub mod events;
pub mod normalize;
pub mod prices;

// Re-export key types
pub use dividends::{AdjustedDividend, AdjustedDividendSeries, adjust_dividends};
pub use events::{FactorTable, cumulative_factor};
pub use normalize::{
    DividendSource, FundamentalNormalizer, NormalizedFundamental, NormalizedFundamentalSeries,
    NormalizerConfig, equivalent_shares,
};
pub use prices::{AdjustedPrice, AdjustedPriceSeries, adjust_prices};
