//! Field extraction: one descriptor applied to one document text.

mod extractor;

pub use extractor::{extract, extract_account, extract_amount, extract_date};

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::ExtractionError;
use crate::models::value::Metadata;

/// Fields a descriptor can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Account,
    Balance,
    Credit,
    Debit,
    Operation,
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Account => "account",
            FieldKind::Balance => "balance",
            FieldKind::Credit => "credit",
            FieldKind::Debit => "debit",
            FieldKind::Operation => "operation",
            FieldKind::Date => "date",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a declared field was left unset.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldProblem {
    /// The pattern did not match the text.
    NotFound,
    /// The pattern matched but the value could not be decoded.
    Invalid(ExtractionError),
}

/// A declared field that could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    /// Qualified descriptor name.
    pub descriptor: String,
    pub field: FieldKind,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::NotFound => write!(f, "{}: {} not found", self.descriptor, self.field),
            FieldProblem::Invalid(e) => write!(f, "{}: {}: {}", self.descriptor, self.field, e),
        }
    }
}

/// Values resolved from one (document, descriptor) pair.
///
/// At most one of `balance` and `operation` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Qualified descriptor name.
    pub descriptor: String,
    pub bank_name: String,
    pub account: Option<String>,
    pub balance: Option<f64>,
    pub operation: Option<f64>,
    pub date: Option<NaiveDate>,
    /// Descriptor pass-through properties.
    pub metadata: Metadata,
}

impl Record {
    /// Ledger key: `bank-name + "-" + account`.
    pub fn account_id(&self) -> Option<String> {
        self.account
            .as_ref()
            .map(|account| format!("{}-{}", self.bank_name, account))
    }
}

/// Result of extracting one descriptor: the record and any unset fields.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub record: Record,
    pub issues: Vec<FieldIssue>,
}
