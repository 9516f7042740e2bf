//! Core library for bank statement aggregation.
//!
//! This crate provides:
//! - Descriptor store (bank-specific patterns and value templates)
//! - Descriptor matching against extracted document text
//! - Field extraction (account, balance, operation, date)
//! - Per-account ledger accumulation and JSON export
//! - Balance timelines with monotone cubic and linear interpolation

pub mod error;
pub mod models;
pub mod rules;
pub mod store;
pub mod matcher;
pub mod extract;
pub mod ledger;
pub mod timeline;
pub mod document;
pub mod pipeline;

pub use error::{TallyError, Result};
pub use models::config::TallyConfig;
pub use models::descriptor::Descriptor;
pub use store::{DescriptorStore, LoadReport};
pub use models::value::{Metadata, Value};
pub use matcher::find_matches;
pub use extract::{extract, Extraction, FieldIssue, FieldKind, Record};
pub use ledger::{AccountEntry, AccountTypes, Ledger, LedgerView, Series};
pub use timeline::{balance_at, materialize, yearly_series, BalanceTimeline};
pub use document::{DocumentCache, PdfTextExtractor, PlainTextExtractor, TextExtractor, TextExtractors};
pub use pipeline::{
    collect_documents, Aggregator, BatchReport, DocumentOutcome, DocumentReport, FailedDocument,
    SkipReason,
};
