//! JSON import/export of the ledger.
//!
//! ```json
//! {
//!   "BNP-123": {
//!     "account": { "bank-name": "BNP", "account": "123", "color": "royalblue" },
//!     "balances": { "2021-06-04": 20.0 },
//!     "operations": { "2021-06-15": -5.0 }
//!   }
//! }
//! ```

use std::path::Path;

use tracing::debug;

use super::Ledger;
use crate::error::Result;

impl Ledger {
    /// Pretty-printed JSON with ISO-8601 date keys.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON export. Every series key must parse as a date.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ledger = Self::from_json(&content)?;
        debug!("Loaded {} accounts from {}", ledger.len(), path.display());
        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!("Saved {} accounts to {}", self.len(), path.display());
        Ok(())
    }
}

/// Serde adapter for date-keyed series.
pub(super) mod date_keyed {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    use crate::ledger::Series;
    use crate::rules::parse_date;

    pub fn serialize<S: Serializer>(series: &Series, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(series.iter().map(|(date, value)| (date.to_string(), value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Series, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| match parse_date(&key) {
                Some(date) => Ok((date, value)),
                None => Err(D::Error::custom(format!("invalid date key: {}", key))),
            })
            .collect()
    }
}
