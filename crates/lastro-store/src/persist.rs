//! Writing derived series to Parquet.

use lastro_traits::{Result, ToFrame};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the instrument key column in every output file.
pub const TICKER_COLUMN: &str = "ticker";

/// Output file kinds written per instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Per-share fundamentals.
    Normalized,
    /// Trailing-twelve-month multiples.
    Multiples,
    /// Quarter-annualized multiples.
    MultiplesQuarterly,
    /// Growth estimates.
    Growth,
}

impl OutputKind {
    /// File name for `ticker`.
    pub fn file_name(&self, ticker: &str) -> String {
        let prefix = match self {
            Self::Normalized => "normalized",
            Self::Multiples => "multiples",
            Self::MultiplesQuarterly => "multiples_quarterly",
            Self::Growth => "growth",
        };
        format!("{prefix}_{ticker}.parquet")
    }
}

/// A directory receiving derived per-ticker Parquet files.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Opens `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one output for `ticker`.
    pub fn path(&self, kind: OutputKind, ticker: &str) -> PathBuf {
        self.dir.join(kind.file_name(ticker))
    }

    /// Renders `series` and writes it as `kind` for `ticker`, with a
    /// leading `ticker` column.
    pub fn write(&self, kind: OutputKind, ticker: &str, series: &dyn ToFrame) -> Result<PathBuf> {
        let mut df = series.to_frame()?;
        let keys = Column::new(TICKER_COLUMN.into(), vec![ticker; df.height()]);
        df.insert_column(0, keys)?;
        let path = self.path(kind, ticker);
        write_parquet(&path, &mut df)?;
        debug!(path = %path.display(), rows = df.height(), "wrote output");
        Ok(path)
    }
}

/// Writes `df` to `path` as Parquet.
pub fn write_parquet(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(df)?;
    Ok(())
}
