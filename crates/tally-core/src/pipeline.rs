//! Batch aggregation: documents -> text -> matching -> extraction -> ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::{DocumentCache, TextExtractors};
use crate::error::{DocumentError, Result, TallyError};
use crate::extract::{extract, FieldIssue};
use crate::ledger::Ledger;
use crate::matcher::{find_matches, unmatched_patterns};
use crate::models::config::TallyConfig;
use crate::models::descriptor::Descriptor;
use crate::rules::normalize_text;
use crate::store::DescriptorStore;

/// Why a document contributed nothing to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// No extractor produced usable text.
    NoText,
    /// No descriptor matched the text.
    NoDescriptor,
    /// Descriptors matched but no record had an account, date and amount.
    NoEntries,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NoText => "no text",
            SkipReason::NoDescriptor => "no matching descriptor",
            SkipReason::NoEntries => "no ledger entries",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Account ids written by the document.
    Aggregated { accounts: Vec<String> },
    Skipped(SkipReason),
}

/// What happened to one document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub path: PathBuf,
    /// Qualified names of the matched descriptors.
    pub matched: Vec<String>,
    pub issues: Vec<FieldIssue>,
    pub outcome: DocumentOutcome,
}

/// A document whose processing raised an error.
#[derive(Debug, Clone)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub error: String,
}

/// Merged ledger plus per-document outcomes of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub ledger: Ledger,
    pub documents: Vec<DocumentReport>,
    pub failed: Vec<FailedDocument>,
}

impl BatchReport {
    /// Merge the outcome of one document into the batch.
    pub fn absorb(&mut self, path: &Path, result: Result<(DocumentReport, Ledger)>) {
        match result {
            Ok((report, ledger)) => {
                self.ledger.merge(ledger);
                self.documents.push(report);
            }
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                self.failed.push(FailedDocument {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    pub fn aggregated(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Aggregated { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&Path, SkipReason)> {
        self.documents.iter().filter_map(|d| match d.outcome {
            DocumentOutcome::Skipped(reason) => Some((d.path.as_path(), reason)),
            DocumentOutcome::Aggregated { .. } => None,
        })
    }

    /// Every unset field, with the document it came from.
    pub fn issues(&self) -> impl Iterator<Item = (&Path, &FieldIssue)> {
        self.documents
            .iter()
            .flat_map(|d| d.issues.iter().map(move |issue| (d.path.as_path(), issue)))
    }
}

/// Runs documents through the descriptor store into a ledger.
pub struct Aggregator {
    store: DescriptorStore,
    extractors: TextExtractors,
    cache: DocumentCache,
    diagnose_unmatched: bool,
}

impl Aggregator {
    pub fn new(store: DescriptorStore, extractors: TextExtractors, cache: DocumentCache) -> Self {
        Self {
            store,
            extractors,
            cache,
            diagnose_unmatched: false,
        }
    }

    /// Aggregator with the built-in extractors, configured from `config`.
    pub fn from_config(store: DescriptorStore, config: &TallyConfig) -> Self {
        Self::new(
            store,
            TextExtractors::with_builtin(config.extraction.default_extractor.clone()),
            DocumentCache::new(config.extraction.cache_capacity),
        )
        .with_diagnostics(config.extraction.diagnose_unmatched)
    }

    /// Log the failing mandatory patterns of every descriptor when a
    /// document matches none.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnose_unmatched = enabled;
        self
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Normalized text of `path`, through the cache.
    pub fn document_text(&mut self, path: &Path, extractor: Option<&str>) -> Result<Option<String>> {
        let Some(extractor) = self.extractors.select(path, extractor) else {
            return Ok(None);
        };
        self.cache.get_or_load(path, extractor.name(), || {
            Ok(extractor.extract_text(path)?.map(|text| normalize_text(&text)))
        })
    }

    /// Aggregate one document into its own ledger.
    ///
    /// A panic raised while processing the document (typically inside a
    /// text extractor) is returned as [`DocumentError::Panicked`].
    pub fn aggregate_document(&mut self, path: &Path) -> Result<(DocumentReport, Ledger)> {
        panic::catch_unwind(AssertUnwindSafe(|| self.aggregate_unguarded(path))).unwrap_or_else(
            |payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(DocumentError::Panicked(message).into())
            },
        )
    }

    fn aggregate_unguarded(&mut self, path: &Path) -> Result<(DocumentReport, Ledger)> {
        let mut report = DocumentReport {
            path: path.to_path_buf(),
            matched: Vec::new(),
            issues: Vec::new(),
            outcome: DocumentOutcome::Skipped(SkipReason::NoDescriptor),
        };
        let mut ledger = Ledger::new();

        // Descriptors may name their own extractor, so the text is read
        // once per extractor and matched against that extractor's descriptors.
        let mut by_extractor: BTreeMap<&str, Vec<&Descriptor>> = BTreeMap::new();
        for descriptor in self.store.descriptors() {
            if let Some(extractor) = self.extractors.select(path, descriptor.parser.as_deref()) {
                by_extractor.entry(extractor.name()).or_default().push(descriptor);
            }
        }

        let mut has_text = false;
        let mut accounts = BTreeSet::new();
        for (name, descriptors) in by_extractor {
            let Some(extractor) = self.extractors.get(name) else {
                continue;
            };
            let text = self.cache.get_or_load(path, name, || {
                Ok(extractor.extract_text(path)?.map(|text| normalize_text(&text)))
            })?;
            let Some(text) = text else {
                debug!("{}: no text from {}", path.display(), name);
                continue;
            };
            has_text = true;

            let matches = find_matches(&text, descriptors.iter().copied());
            if matches.is_empty() && self.diagnose_unmatched {
                for descriptor in &descriptors {
                    let missing: Vec<String> = unmatched_patterns(&text, descriptor)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    info!(
                        "{}: {} does not match ({})",
                        path.display(),
                        descriptor.qualified_name(),
                        missing.join(", ")
                    );
                }
            }

            for descriptor in matches {
                report.matched.push(descriptor.qualified_name());
                let extraction = extract(&text, descriptor);
                report.issues.extend(extraction.issues);
                if let Some(id) = ledger.accumulate(&extraction.record) {
                    accounts.insert(id);
                }
            }
        }

        report.outcome = if !self.store.is_empty() && !has_text {
            DocumentOutcome::Skipped(SkipReason::NoText)
        } else if report.matched.is_empty() {
            DocumentOutcome::Skipped(SkipReason::NoDescriptor)
        } else if accounts.is_empty() {
            DocumentOutcome::Skipped(SkipReason::NoEntries)
        } else {
            DocumentOutcome::Aggregated {
                accounts: accounts.into_iter().collect(),
            }
        };

        match &report.outcome {
            DocumentOutcome::Aggregated { accounts } => {
                info!("{}: {}", path.display(), accounts.join(", "))
            }
            DocumentOutcome::Skipped(reason) => info!("{}: skipped ({})", path.display(), reason),
        }

        Ok((report, ledger))
    }

    /// Aggregate a document, or every document under a folder.
    ///
    /// A document that fails is recorded in the report and the batch
    /// continues. Only a missing or unreadable input path is an error.
    pub fn aggregate_paths(&mut self, path: &Path) -> Result<BatchReport> {
        let documents = collect_documents(path)?;
        let mut batch = BatchReport::default();
        for document in documents {
            let result = self.aggregate_document(&document);
            batch.absorb(&document, result);
        }
        Ok(batch)
    }
}

/// `path` itself when it is a file, otherwise every file below it, sorted.
pub fn collect_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(TallyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let pattern = path.join("**").join("*");
    let mut documents: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| TallyError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?
        .filter_map(|entry| match entry {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Cannot access {}: {}", e.path().display(), e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    documents.sort();
    Ok(documents)
}
