//! Error types for docxcite.

use thiserror::Error;

/// Result type for docxcite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// The DOCX package could not be parsed.
    #[error("Failed to parse DOCX file: {0}")]
    DocxParse(String),

    /// Error occurred during file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required part is missing from the DOCX archive.
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// The citation markup in the document text is structurally invalid.
    #[error("Citation markup error: {0}")]
    Citation(#[from] ParseFailure),

    /// The bibliography database could not be parsed.
    #[error("BibTeX parse error at line {line}: {message}")]
    BibParse { line: usize, message: String },

    /// The requested style is unknown or incomplete.
    #[error("Style error: {0}")]
    Style(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A style template could not be rendered.
    #[error("Template error: {0}")]
    Template(String),
}

/// Structural failure of the citation tag parser.
///
/// Fatal to a single extraction call: no partial substitution is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A bibliography marker opens the document, so there is no text block
    /// in front of it to harvest citations from.
    #[error("bibliography marker `{payload}` has no preceding text block")]
    LeadingBibliography { payload: String },
}
