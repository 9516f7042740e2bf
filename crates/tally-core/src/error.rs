//! Error types for the tally-core library.

use thiserror::Error;

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// Descriptor store or application configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document text extraction error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Ledger import/export error.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading and compiling descriptors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The descriptor directory itself could not be enumerated.
    #[error("cannot enumerate descriptor directory {path}: {reason}")]
    Enumerate { path: String, reason: String },

    /// A descriptor file could not be read or decoded.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// A pattern did not compile.
    #[error("invalid pattern for {field}: {reason}")]
    Pattern { field: String, reason: String },

    /// A value template is malformed.
    #[error("invalid template '{template}': {reason}")]
    Template { template: String, reason: String },

    /// The descriptor has no bank name.
    #[error("descriptor has no bank-name")]
    MissingBankName,

    /// Two mutually exclusive fields are both declared.
    #[error("{first} and {second} are mutually exclusive")]
    Conflict { first: String, second: String },
}

/// Errors related to decoding a single field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Formatting captured groups into a template failed.
    #[error("cannot format {groups} group(s) with '{template}': {reason}")]
    Template {
        template: String,
        groups: usize,
        reason: String,
    },

    /// More captured groups than the default template handles.
    #[error("{field} captured {groups} groups; an explicit value template is required")]
    TemplateRequired { field: String, groups: usize },

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },
}

/// Errors related to turning a document into text.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from the document.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Processing the document panicked.
    #[error("processing panicked: {0}")]
    Panicked(String),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
