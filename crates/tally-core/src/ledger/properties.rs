//! Account properties and the read-only query view used by reporting.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use super::{Ledger, Series};
use crate::models::value::{deep_merge, Metadata, Value};
use crate::timeline::{self, yearly_series, BalanceTimeline};

/// Fallback group for accounts without a known `account-type`.
pub const OTHER: &str = "other";

/// Default properties per `account-type`.
///
/// Deserialized entries are merged over the built-in types, so a
/// configuration only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AccountTypes {
    types: BTreeMap<String, Metadata>,
}

impl Default for AccountTypes {
    fn default() -> Self {
        let defaults = [
            ("checking", "royalblue", None),
            ("saving", "tomato", None),
            ("life-insurance", "olivedrab", None),
            ("loan", "gold", None),
            ("real-estate", "sandybrown", None),
            ("crowd-funding", "green", Some("operations")),
            (OTHER, "silver", None),
        ];
        let types = defaults
            .into_iter()
            .map(|(name, color, input)| {
                let mut props = Metadata::new();
                props.insert("color".into(), color.into());
                if let Some(input) = input {
                    props.insert("input".into(), input.into());
                }
                (name.to_string(), props)
            })
            .collect();
        Self { types }
    }
}

impl<'de> Deserialize<'de> for AccountTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = BTreeMap::<String, Metadata>::deserialize(deserializer)?;
        let mut types = Self::default();
        for (name, props) in overrides {
            deep_merge(types.types.entry(name).or_default(), props);
        }
        Ok(types)
    }
}

impl AccountTypes {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn defaults(&self, account_type: &str) -> Option<&Metadata> {
        self.types.get(account_type)
    }

    /// Override one default property of an account type.
    pub fn set_default(&mut self, account_type: &str, key: &str, value: Value) {
        self.types
            .entry(account_type.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// `account` overlaid on the defaults of its `account-type`.
    pub fn properties(&self, account: &Metadata) -> Metadata {
        let mut props = account
            .get("account-type")
            .and_then(Value::as_str)
            .and_then(|t| self.types.get(t))
            .cloned()
            .unwrap_or_default();
        deep_merge(&mut props, account.clone());
        props
    }
}

/// Query access to a ledger with account-type defaults applied.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    pub ledger: &'a Ledger,
    pub types: &'a AccountTypes,
}

impl<'a> LedgerView<'a> {
    pub fn new(ledger: &'a Ledger, types: &'a AccountTypes) -> Self {
        Self { ledger, types }
    }

    /// Effective properties of an account.
    pub fn properties(&self, id: &str) -> Option<Metadata> {
        self.ledger
            .get(id)
            .map(|entry| self.types.properties(&entry.account))
    }

    pub fn timeline(&self, id: &str) -> Option<BalanceTimeline> {
        let entry = self.ledger.get(id)?;
        Some(BalanceTimeline::for_account(
            entry,
            &self.types.properties(&entry.account),
        ))
    }

    /// Balance of one account on `day`; `None` for an unknown account.
    pub fn balance_at(&self, id: &str, day: NaiveDate, yearly: bool) -> Option<f64> {
        let entry = self.ledger.get(id)?;
        Some(timeline::balance_at(entry, self.types, day, yearly))
    }

    /// Per-account balances on `day`, aligned with `ids`. Unknown
    /// accounts contribute 0.
    pub fn balances_at(&self, ids: &[&str], day: NaiveDate, yearly: bool) -> Vec<f64> {
        ids.iter()
            .map(|id| {
                self.balance_at(id, day, yearly).unwrap_or_else(|| {
                    warn!("Unknown account {}", id);
                    0.0
                })
            })
            .collect()
    }

    /// Every known date of the accounts, mapped to the per-account values
    /// aligned with `ids`.
    pub fn balances_over(&self, ids: &[&str], yearly: bool) -> BTreeMap<NaiveDate, Vec<f64>> {
        let timelines: Vec<Option<BalanceTimeline>> = ids.iter().map(|id| self.timeline(id)).collect();

        let mut dates = BTreeSet::new();
        for timeline in timelines.iter().flatten() {
            if yearly {
                dates.extend(yearly_series(timeline).into_keys());
            } else {
                dates.extend(timeline.dates());
            }
        }

        dates
            .into_iter()
            .map(|day| {
                let values = timelines
                    .iter()
                    .map(|t| t.as_ref().map_or(0.0, |t| value_at(t, day, yearly)))
                    .collect();
                (day, values)
            })
            .collect()
    }

    /// Resolved balance series of one account.
    pub fn series(&self, id: &str, yearly: bool) -> Option<Series> {
        let timeline = self.timeline(id)?;
        Some(if yearly {
            yearly_series(&timeline)
        } else {
            timeline.series().clone()
        })
    }

    /// Account ids grouped by `account-type`, in the order of `types`.
    /// Accounts whose type is not listed fall into [`OTHER`].
    pub fn group_by_type(&self, types: &[&str]) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = types
            .iter()
            .filter(|t| **t != OTHER)
            .chain(std::iter::once(&OTHER))
            .map(|t| (t.to_string(), Vec::new()))
            .collect();

        for (id, entry) in self.ledger.accounts() {
            let props = self.types.properties(&entry.account);
            let account_type = props.get("account-type").and_then(Value::as_str);
            let slot = groups
                .iter()
                .position(|(t, _)| Some(t.as_str()) == account_type)
                .unwrap_or(groups.len() - 1);
            groups[slot].1.push(id.to_string());
        }

        groups.retain(|(_, ids)| !ids.is_empty());
        groups
    }
}

fn value_at(timeline: &BalanceTimeline, day: NaiveDate, yearly: bool) -> f64 {
    if yearly {
        timeline.yearly_at(day)
    } else {
        timeline.at(day)
    }
}
