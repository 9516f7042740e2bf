//! Document text extraction.

mod cache;
mod pdf;
mod plain;

pub use cache::DocumentCache;
pub use pdf::PdfTextExtractor;
pub use plain::PlainTextExtractor;

use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Turns a document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Registry name, as used by the descriptor `parser` key.
    fn name(&self) -> &str;

    /// Whether this extractor understands `path`.
    fn handles(&self, path: &Path) -> bool;

    /// Text of the document, or `None` when it has no usable content.
    fn extract_text(&self, path: &Path) -> Result<Option<String>>;
}

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Named text extractors with a default.
pub struct TextExtractors {
    extractors: Vec<Box<dyn TextExtractor>>,
    default: String,
}

impl TextExtractors {
    /// Empty registry.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            extractors: Vec::new(),
            default: default.into(),
        }
    }

    /// Registry with the PDF and plain text extractors.
    pub fn with_builtin(default: impl Into<String>) -> Self {
        let mut registry = Self::new(default);
        registry.register(Box::new(PdfTextExtractor::new()));
        registry.register(Box::new(PlainTextExtractor::new()));
        registry
    }

    /// Add an extractor, replacing any with the same name.
    pub fn register(&mut self, extractor: Box<dyn TextExtractor>) {
        self.extractors.retain(|e| e.name() != extractor.name());
        self.extractors.push(extractor);
    }

    pub fn get(&self, name: &str) -> Option<&dyn TextExtractor> {
        self.extractors
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extractors.iter().map(|e| e.name())
    }

    /// Pick the extractor for `path`: the requested one, then the
    /// default, then the first registered one that handles the path.
    pub fn select(&self, path: &Path, requested: Option<&str>) -> Option<&dyn TextExtractor> {
        if let Some(name) = requested {
            match self.get(name) {
                Some(e) if e.handles(path) => return Some(e),
                Some(_) => debug!("Extractor {} does not handle {}", name, path.display()),
                None => debug!("Unknown extractor {}, falling back", name),
            }
        }
        self.get(&self.default)
            .filter(|e| e.handles(path))
            .or_else(|| {
                self.extractors
                    .iter()
                    .map(|e| e.as_ref())
                    .find(|e| e.handles(path))
            })
    }
}

impl Default for TextExtractors {
    fn default() -> Self {
        Self::with_builtin("pdf")
    }
}
