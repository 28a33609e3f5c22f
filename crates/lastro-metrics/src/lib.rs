//! Valuation multiples and growth estimates for lastro.
//!
//! Both engines consume series already expressed in today's share basis:
//! - [`multiples`]: daily price and enterprise-value multiples, quarterly-annualized and TTM
//! - [`growth`]: rolling log-linear trend growth of revenue, EBITDA, earnings and dividends
//!
//! # Example
//!
//! ```ignore
//! use lastro_metrics::{GrowthEngine, MultiplesEngine};
//!
//! let (quarterly, annual) = MultiplesEngine::default().compute(&normalized, &prices);
//! let growth = GrowthEngine::default().compute_growth(&normalized);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod growth;
pub mod multiples;

// Re-export key types
pub use growth::{
    DEGENERATE_GROWTH, GrowthConfig, GrowthEngine, GrowthRate, GrowthRow, GrowthSeries,
    TrackedFundamental,
};
pub use multiples::{
    MultiplesConfig, MultiplesEngine, MultiplesRow, MultiplesSeries, MultiplesVariant,
};
