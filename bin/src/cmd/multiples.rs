//! Multiples command implementation.

use crate::data;
use anyhow::Result;
use lastro::PipelineConfig;

/// Print the most recent daily multiples of one instrument.
pub(crate) fn show_multiples(
    raw_dir: &std::path::Path,
    ticker: &str,
    quarterly: bool,
    rows: usize,
    config: &PipelineConfig,
) -> Result<()> {
    let outputs = data::load_instrument(raw_dir, ticker, config)?;
    let series = if quarterly {
        &outputs.quarterly
    } else {
        &outputs.annual
    };

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Daily Multiples                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Ticker: {}", ticker);
    println!("Basis:  {}", series.variant().label());
    println!("Days:   {}", series.len());
    println!();

    if series.is_empty() {
        println!("No trading days on or after the first report.");
        return Ok(());
    }

    println!(
        "{:<12} {:>10} {:>8} {:>8} {:>8} {:>9} {:>8} {:>8}",
        "Date", "Close", "P/E", "P/B", "P/S", "EV/EBITDA", "ROE", "DY 1y"
    );
    println!("{}", "─".repeat(80));
    let start = series.len().saturating_sub(rows);
    for row in &series.rows()[start..] {
        println!(
            "{:<12} {:>10.2} {:>8.2} {:>8.2} {:>8.2} {:>9.2} {:>7.1}% {:>7.2}%",
            row.date.to_string(),
            row.equivalent_close,
            row.price_to_earnings,
            row.price_to_book,
            row.price_to_sales,
            row.ev_to_ebitda,
            row.return_on_equity * 100.0,
            row.dividend_yield[0] * 100.0,
        );
    }
    println!();

    Ok(())
}
