//! Show-config command implementation.

use anyhow::Result;
use lastro::PipelineConfig;

/// Print the effective configuration as JSON.
pub(crate) fn show_config(config: &PipelineConfig) -> Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}
