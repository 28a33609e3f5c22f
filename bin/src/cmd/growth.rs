//! Growth command implementation.

use crate::data;
use anyhow::Result;
use lastro::PipelineConfig;
use lastro::metrics::{GrowthRate, TrackedFundamental};

fn format_rate(rate: GrowthRate) -> String {
    match rate {
        GrowthRate::Value(rate) => format!("{:.1}%", rate * 100.0),
        GrowthRate::Insufficient => "n/a".to_string(),
        GrowthRate::Degenerate => "neg".to_string(),
    }
}

/// Print the latest growth estimates of one instrument.
pub(crate) fn show_growth(
    raw_dir: &std::path::Path,
    ticker: &str,
    config: &PipelineConfig,
) -> Result<()> {
    let outputs = data::load_instrument(raw_dir, ticker, config)?;
    let growth = &outputs.growth;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Trend Growth                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Ticker: {}", ticker);
    if let Some(date) = outputs.normalized.rows().last().map(|r| r.report_date) {
        println!("As of:  {}", date);
    }
    println!();

    let mut header = format!("{:<12}", "Fundamental");
    for years in growth.windows() {
        header.push_str(&format!(" {:>9}", format!("{years}y")));
    }
    header.push_str(&format!(" {:>9}", "Average"));
    println!("{}", header);
    println!("{}", "─".repeat(header.len()));

    for fundamental in TrackedFundamental::ALL {
        let Some(row) = growth.latest(fundamental) else {
            continue;
        };
        let mut line = format!("{:<12}", fundamental.label());
        for rate in &row.rates {
            line.push_str(&format!(" {:>9}", format_rate(*rate)));
        }
        line.push_str(&format!(" {:>8.1}%", row.average * 100.0));
        println!("{}", line);
    }
    println!();

    Ok(())
}
