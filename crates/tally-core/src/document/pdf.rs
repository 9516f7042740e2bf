//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use std::path::Path;
use tracing::debug;

use super::{has_extension, TextExtractor};
use crate::error::{DocumentError, Result};

/// Extracts the embedded text layer of PDF statements.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Text of an in-memory PDF.
    pub fn extract_from_mem(&self, data: &[u8]) -> Result<String> {
        let mut doc = Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        // Statements are often encrypted with an empty user password
        let decrypted;
        let raw: &[u8] = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(DocumentError::Encrypted.into());
            }
            debug!("Decrypted PDF with empty password");

            let mut buffer = Vec::new();
            doc.save_to(&mut buffer)
                .map_err(|e| DocumentError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted = buffer;
            &decrypted
        } else {
            data
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(DocumentError::NoPages.into());
        }
        debug!("Loaded PDF with {} pages", page_count);

        let text = pdf_extract::extract_text_from_mem(raw)
            .map_err(|e| DocumentError::TextExtraction(e.to_string()))?;
        Ok(text)
    }
}

impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn handles(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn extract_text(&self, path: &Path) -> Result<Option<String>> {
        if !self.handles(path) {
            return Ok(None);
        }
        let data = std::fs::read(path)?;
        let text = self.extract_from_mem(&data)?;
        if text.trim().is_empty() {
            debug!("No text layer in {}", path.display());
            return Ok(None);
        }
        Ok(Some(text))
    }
}
