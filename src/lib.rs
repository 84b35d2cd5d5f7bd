//! # docxcite
//!
//! Replaces LaTeX-style citation markup in `.docx` documents with formatted
//! references taken from a BibTeX database.
//!
//! Authors write `\cite{key}` wherever a citation belongs and
//! `\bibliography{name}` (or `\bib{name}`) where the reference list should
//! appear. Each bibliography collects the citations written in front of it.
//! Citation styles may use the inline tags `<b>`, `<i>`, `<u>`,
//! `<font size=".." color="..">` and `<br />`, which become native run
//! formatting in the output document.
//!
//! ## Example
//!
//! ```no_run
//! use docxcite::{CitationProcessor, ConvertOptions, TracingSink};
//!
//! let options = ConvertOptions {
//!     style: "alpha".into(),
//!     ..Default::default()
//! };
//!
//! let sink = TracingSink;
//! let processor = CitationProcessor::new(options, &sink);
//! let report = processor
//!     .process("paper.docx", "refs.bib", "paper-cited.docx")
//!     .unwrap();
//! println!("{} citations", report.citations);
//! ```

pub mod adapters;
pub mod citation;
pub mod converter;
pub mod core;
pub mod database;
pub mod error;
pub mod logging;
pub mod markup;
pub mod render;
pub mod style;

pub use converter::{
    convert_document_xml, convert_inline_markup, split_run, CitationProcessor, ConversionReport,
};
pub use error::{Error, ParseFailure, Result};
pub use logging::{CollectingSink, LogLevel, LogSink, TracingSink};

use std::path::PathBuf;

/// Style used when none is requested.
pub const DEFAULT_STYLE: &str = "numeric";

/// Options for citation processing.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Name of the citation style, matched case-insensitively.
    pub style: String,
    /// JSON style sheet to load styles from instead of the builtin ones.
    pub styles_file: Option<PathBuf>,
    /// Whether to re-open the written document to check it still loads.
    pub verify_output: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_string(),
            styles_file: None,
            verify_output: true,
        }
    }
}
