//! Plain text documents (statements already converted to text).

use std::path::Path;

use super::{has_extension, TextExtractor};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn handles(&self, path: &Path) -> bool {
        has_extension(path, &["txt", "text"])
    }

    fn extract_text(&self, path: &Path) -> Result<Option<String>> {
        if !self.handles(path) {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }
}
