//! CLI commands.

pub mod accounts;
pub mod aggregate;
pub mod balance;
pub mod config;

use std::path::Path;

use tally_core::TallyConfig;
use tracing::debug;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text table
    Text,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

/// Configuration from `--config`, else the default config file, else
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TallyConfig> {
    if let Some(path) = config_path {
        return Ok(TallyConfig::from_file(Path::new(path))?);
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        return Ok(TallyConfig::from_file(&default_path)?);
    }
    Ok(TallyConfig::default())
}
