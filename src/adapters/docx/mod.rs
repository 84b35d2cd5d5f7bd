mod container;

use crate::Result;
use std::path::Path;

/// Access to the main text payload of a document package.
pub trait DocumentContainer {
    /// Returns the main document part as text.
    fn read_document(&self) -> Result<String>;

    /// Writes a copy of the package to `output` with the main document part
    /// replaced by `document`. Every other part is copied unchanged.
    fn write_document(&self, document: &str, output: &Path) -> Result<()>;
}

pub use container::{verify_docx, DocxContainer, DOCUMENT_PART};
