//! Per-account ledger accumulated from extracted records.

mod export;
mod properties;

pub use properties::{AccountTypes, LedgerView};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

use crate::extract::Record;
use crate::models::value::{deep_merge, Metadata, Value};

/// Date-ordered amounts.
pub type Series = BTreeMap<NaiveDate, f64>;

/// One account: static properties plus the two date-keyed series.
///
/// A balance is an absolute snapshot, an operation is a signed delta.
/// The two series may share dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    #[serde(default)]
    pub account: Metadata,

    #[serde(default, with = "export::date_keyed", skip_serializing_if = "Series::is_empty")]
    pub balances: Series,

    #[serde(default, with = "export::date_keyed", skip_serializing_if = "Series::is_empty")]
    pub operations: Series,
}

impl AccountEntry {
    /// Earliest and latest date across both series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = [self.balances.keys().next(), self.operations.keys().next()]
            .into_iter()
            .flatten()
            .min()?;
        let last = [self.balances.keys().next_back(), self.operations.keys().next_back()]
            .into_iter()
            .flatten()
            .max()?;
        Some((*first, *last))
    }

    fn absorb(&mut self, other: AccountEntry) {
        self.balances.extend(other.balances);
        self.operations.extend(other.operations);
        deep_merge(&mut self.account, other.account);
    }
}

/// Account id (`bank-name-account`) to account entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    accounts: BTreeMap<String, AccountEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one record into its account entry.
    ///
    /// Only records carrying an account, a date and an amount are written.
    /// A later write at an identical date replaces the earlier value;
    /// record metadata is deep-merged into the account properties.
    /// Returns the account id written to.
    pub fn accumulate(&mut self, record: &Record) -> Option<String> {
        let (Some(account), Some(date)) = (&record.account, record.date) else {
            trace!("{}: record without account or date", record.descriptor);
            return None;
        };
        if record.balance.is_none() && record.operation.is_none() {
            trace!("{}: record without amount", record.descriptor);
            return None;
        }

        let id = format!("{}-{}", record.bank_name, account);
        let entry = self.accounts.entry(id.clone()).or_default();
        if let Some(balance) = record.balance {
            entry.balances.insert(date, balance);
        }
        if let Some(operation) = record.operation {
            entry.operations.insert(date, operation);
        }

        let mut metadata = record.metadata.clone();
        metadata.insert("account".into(), Value::Text(account.clone()));
        deep_merge(&mut entry.account, metadata);

        Some(id)
    }

    /// Merge another ledger into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: Ledger) {
        for (id, entry) in other.accounts {
            self.accounts.entry(id).or_default().absorb(entry);
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: AccountEntry) {
        self.accounts.insert(id.into(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&AccountEntry> {
        self.accounts.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&str, &AccountEntry)> {
        self.accounts.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn balance(account: &str, date: NaiveDate, amount: f64) -> Record {
        let mut metadata = Metadata::new();
        metadata.insert("bank-name".into(), "BNP".into());
        Record {
            descriptor: "bnp/Checking".into(),
            bank_name: "BNP".into(),
            account: Some(account.into()),
            balance: Some(amount),
            date: Some(date),
            metadata,
            ..Default::default()
        }
    }

    fn operation(account: &str, date: NaiveDate, amount: f64) -> Record {
        Record {
            balance: None,
            operation: Some(amount),
            ..balance(account, date, 0.0)
        }
    }

    #[test]
    fn test_accumulate_creates_entry() {
        let mut ledger = Ledger::new();
        let id = ledger.accumulate(&balance("123", day(2021, 6, 4), 20.0));

        assert_eq!(id.as_deref(), Some("BNP-123"));
        let entry = ledger.get("BNP-123").unwrap();
        assert_eq!(entry.balances[&day(2021, 6, 4)], 20.0);
        assert!(entry.operations.is_empty());
        assert_eq!(entry.account["account"], Value::Text("123".into()));
        assert_eq!(entry.account["bank-name"], Value::Text("BNP".into()));
    }

    #[test]
    fn test_balance_and_operation_share_a_date() {
        let mut ledger = Ledger::new();
        ledger.accumulate(&balance("123", day(2021, 6, 4), 20.0));
        ledger.accumulate(&operation("123", day(2021, 6, 4), -5.0));

        let entry = ledger.get("BNP-123").unwrap();
        assert_eq!(entry.balances[&day(2021, 6, 4)], 20.0);
        assert_eq!(entry.operations[&day(2021, 6, 4)], -5.0);
    }

    #[test]
    fn test_incomplete_records_are_not_written() {
        let mut ledger = Ledger::new();

        let mut no_date = balance("123", day(2021, 1, 1), 1.0);
        no_date.date = None;
        assert_eq!(ledger.accumulate(&no_date), None);

        let mut no_account = balance("123", day(2021, 1, 1), 1.0);
        no_account.account = None;
        assert_eq!(ledger.accumulate(&no_account), None);

        let mut no_amount = balance("123", day(2021, 1, 1), 1.0);
        no_amount.balance = None;
        assert_eq!(ledger.accumulate(&no_amount), None);

        assert!(ledger.is_empty());
    }

    #[test]
    fn test_merge_order_only_matters_for_conflicts() {
        let records = [
            balance("1", day(2020, 1, 31), 10.0),
            balance("1", day(2020, 2, 29), 12.0),
            operation("2", day(2020, 3, 1), 7.5),
            balance("1", day(2020, 3, 31), 15.0),
            // conflicts with the first record
            balance("1", day(2020, 1, 31), 99.0),
        ];

        let mut forward = Ledger::new();
        for r in &records {
            forward.accumulate(r);
        }
        let mut backward = Ledger::new();
        for r in records.iter().rev() {
            backward.accumulate(r);
        }

        let f = forward.get("BNP-1").unwrap();
        let b = backward.get("BNP-1").unwrap();
        for date in [day(2020, 2, 29), day(2020, 3, 31)] {
            assert_eq!(f.balances[&date], b.balances[&date]);
        }
        assert_eq!(f.balances[&day(2020, 1, 31)], 99.0);
        assert_eq!(b.balances[&day(2020, 1, 31)], 10.0);
        assert_eq!(forward.get("BNP-2"), backward.get("BNP-2"));
    }

    #[test]
    fn test_merge_ledgers() {
        let mut first = Ledger::new();
        first.accumulate(&balance("1", day(2020, 1, 31), 10.0));

        let mut second = Ledger::new();
        let mut record = balance("1", day(2020, 2, 29), 12.0);
        record.metadata.insert("color".into(), "red".into());
        second.accumulate(&record);
        second.accumulate(&operation("2", day(2020, 3, 1), 7.5));

        first.merge(second);

        assert_eq!(first.ids().collect::<Vec<_>>(), vec!["BNP-1", "BNP-2"]);
        let entry = first.get("BNP-1").unwrap();
        assert_eq!(entry.balances.len(), 2);
        assert_eq!(entry.account["color"], Value::Text("red".into()));
    }

    #[test]
    fn test_date_range_spans_both_series() {
        let mut ledger = Ledger::new();
        ledger.accumulate(&balance("1", day(2020, 5, 1), 1.0));
        ledger.accumulate(&operation("1", day(2019, 3, 1), 1.0));
        ledger.accumulate(&operation("1", day(2020, 1, 1), 1.0));

        let range = ledger.get("BNP-1").unwrap().date_range();
        assert_eq!(range, Some((day(2019, 3, 1), day(2020, 5, 1))));
        assert_eq!(AccountEntry::default().date_range(), None);
    }
}
