#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core definitions for the lastro fundamentals engine.
//!
//! This crate provides the raw record types consumed by the engine, the error
//! taxonomy, the [`ToFrame`] abstraction used to hand series to polars, and the
//! small numeric kernels (zero-guarded ratios, trend fitting) every stage shares.

/// The version of the lastro-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod frame;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{LastroError, Result};
pub use frame::ToFrame;
pub use types::{
    CorporateActionEvent, Date, DividendKind, DividendRecord, PriceRecord, RawFundamentalRecord,
    ShareClass, Symbol, DIVIDEND_HORIZONS, years_before,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
