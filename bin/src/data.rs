//! Data loading utilities for the lastro CLI.

use anyhow::{Context, Result};
use lastro::store::RawStore;
use lastro::{InstrumentOutputs, PipelineConfig, Symbol, run_instrument};
use std::path::Path;

/// Load the pipeline configuration, or the defaults when no file is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Parse a ticker list: one ticker per line, blank lines and `#` comments
/// ignored.
pub(crate) fn parse_ticker_list(text: &str) -> Vec<Symbol> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_uppercase)
        .collect()
}

/// Resolve the tickers to process: explicit tickers and the list file
/// combined, or every ticker in the raw directory when neither is given.
pub(crate) fn resolve_tickers(
    raw: &RawStore,
    tickers: Vec<String>,
    list: Option<&Path>,
) -> Result<Vec<Symbol>> {
    let mut resolved: Vec<Symbol> = tickers.iter().map(|t| t.trim().to_uppercase()).collect();
    if let Some(list) = list {
        let text = std::fs::read_to_string(list)
            .with_context(|| format!("Failed to read ticker list {}", list.display()))?;
        resolved.extend(parse_ticker_list(&text));
    }
    if resolved.is_empty() {
        resolved = raw
            .tickers()
            .with_context(|| format!("Failed to list {}", raw.dir().display()))?;
    }
    resolved.sort();
    resolved.dedup();
    Ok(resolved)
}

/// Load one instrument from the raw directory and run the pipeline on it.
pub(crate) fn load_instrument(
    raw_dir: &Path,
    ticker: &str,
    config: &PipelineConfig,
) -> Result<InstrumentOutputs> {
    let inputs = RawStore::new(raw_dir)
        .load(ticker)
        .with_context(|| format!("Failed to load {ticker}"))?;
    Ok(run_instrument(&inputs, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticker_list() {
        let tickers = parse_ticker_list("petr4\n\n# banks\nITUB4 \n");
        assert_eq!(tickers, vec!["PETR4".to_string(), "ITUB4".to_string()]);
    }

    #[test]
    fn test_resolve_tickers_merges_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("tickers.txt");
        std::fs::write(&list, "VALE3\nPETR4\n").unwrap();
        let raw = RawStore::new(dir.path());

        let tickers = resolve_tickers(&raw, vec!["petr4".to_string()], Some(&list)).unwrap();
        assert_eq!(tickers, vec!["PETR4".to_string(), "VALE3".to_string()]);
    }

    #[test]
    fn test_resolve_tickers_defaults_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ABCD3_Fund.parquet"), b"").unwrap();
        let raw = RawStore::new(dir.path());
        assert_eq!(resolve_tickers(&raw, Vec::new(), None).unwrap(), vec!["ABCD3".to_string()]);
    }

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.growth.windows, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/lastro.json"))).is_err());
    }
}
