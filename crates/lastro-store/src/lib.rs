//! Parquet storage for lastro.
//!
//! - [`ingest`]: raw vendor tables into typed records
//! - [`persist`]: derived series out to per-ticker Parquet files

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod ingest;
pub mod persist;

// Re-export key types
pub use ingest::{InstrumentInputs, RawStore, parse_date, parse_locale_f64, read_parquet};
pub use persist::{OutputKind, OutputStore, TICKER_COLUMN, write_parquet};
