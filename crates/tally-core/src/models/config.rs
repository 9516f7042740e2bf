//! Configuration structures for the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TallyError};
use crate::ledger::AccountTypes;

/// Main configuration for tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Descriptor store configuration.
    pub store: StoreConfig,

    /// Document text extraction configuration.
    pub extraction: ExtractionConfig,

    /// Default properties per account type.
    pub accounts: AccountTypes,
}

/// Descriptor store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding descriptor files.
    pub dir: PathBuf,

    /// Descriptor file extension.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("confs"),
            extension: "json".to_string(),
        }
    }
}

/// Document text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Text extractor used when a descriptor names none.
    pub default_extractor: String,

    /// Number of document texts kept in memory.
    pub cache_capacity: usize,

    /// Log which mandatory patterns failed when no descriptor matches.
    pub diagnose_unmatched: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_extractor: "pdf".to_string(),
            cache_capacity: 10,
            diagnose_unmatched: false,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(TallyError::from)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
