#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # lastro
//!
//! Corporate-action-adjusted fundamentals for equity valuation.
//!
//! lastro is an umbrella crate that re-exports the lastro sub-crates and owns
//! the per-instrument pipeline and the parallel batch driver.
//!
//! ## Crate Organization
//!
//! - [`traits`] - Record types, errors and numeric helpers
//! - [`adjust`] - Event factors, dividends, normalization and price adjustment
//! - [`metrics`] - Daily multiples and growth estimates
//! - [`store`] - Parquet ingestion and persistence
//! - [`pipeline`] - One instrument, all stages
//! - [`batch`] - Many instruments in parallel, failures isolated
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! 1. **Events** become a table of backward adjustment factors
//! 2. **Fundamentals** are expressed per equivalent share in today's basis
//! 3. **Prices** are joined to the snapshot in effect and adjusted
//! 4. **Multiples** and **growth** are computed from the adjusted series

/// Version information for the lastro crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod batch;
pub mod pipeline;

/// Record types, errors and numeric helpers.
pub mod traits {
    pub use lastro_traits::*;
}

/// Corporate-action adjustment and per-share normalization.
pub mod adjust {
    pub use lastro_adjust::*;
}

/// Valuation multiples and growth estimates.
pub mod metrics {
    pub use lastro_metrics::*;
}

/// Parquet ingestion and persistence.
pub mod store {
    pub use lastro_store::*;
}

pub use batch::{BatchReport, Excluded, run_batch, run_loaded};
pub use pipeline::{InstrumentOutputs, PipelineConfig, run_instrument};

// Re-export error types
pub use lastro_traits::{LastroError, Result};

// Re-export common types
pub use lastro_store::InstrumentInputs;
pub use lastro_traits::{Date, ShareClass, Symbol, ToFrame};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use lastro::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adjust::{FactorTable, FundamentalNormalizer, NormalizerConfig};
    pub use crate::metrics::{GrowthEngine, GrowthRate, MultiplesEngine, TrackedFundamental};
    pub use crate::traits::*;
    pub use crate::{InstrumentInputs, InstrumentOutputs, PipelineConfig, run_instrument};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_error_types() {
        let _result: Result<()> = Ok(());
        let error = LastroError::InvalidData("test".to_string());
        assert!(error.is_data_error());
    }
}
