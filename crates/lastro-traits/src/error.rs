//! Error types for the lastro engine.
//!
//! Only conditions that make an instrument's numbers meaningless are errors.
//! Short growth windows, degenerate regressions and trading days without a
//! fundamental snapshot are handled where they occur and never surface here.

use thiserror::Error;

/// The main error type for lastro operations.
#[derive(Debug, Error)]
pub enum LastroError {
    /// A record failed a mandatory integrity check (zero share count,
    /// zero equivalence factor). Aborts the instrument's normalization.
    #[error("Data integrity error at {date}: {reason}")]
    DataIntegrity {
        /// Report date of the offending record.
        date: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from an input table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error when a date is out of range or cannot be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error when an input set is empty where the stage needs data.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LastroError {
    /// Builds a [`LastroError::DataIntegrity`] for the record dated `date`.
    pub fn integrity(date: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            date: date.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the instrument's data, as opposed to an
    /// environmental failure such as a missing file.
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::DataIntegrity { .. } | Self::InvalidData(_) | Self::InsufficientData(_)
        )
    }
}

/// A specialized Result type for lastro operations.
pub type Result<T> = std::result::Result<T, LastroError>;
