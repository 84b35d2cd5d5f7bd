//! Citation processing pipeline.

mod elements;
mod properties;
mod run;

use crate::adapters::docx::{verify_docx, DocumentContainer, DocxContainer};
use crate::citation::{extract, fill_placeholders, references};
use crate::core::{Bibliographies, NativeRun, RunProps};
use crate::database::{BibDatabase, BibTexDatabase};
use crate::logging::{LogLevel, LogSink};
use crate::style::{StyleCatalog, StyleSheet};
use crate::{ConvertOptions, Result};
use serde::Serialize;
use std::path::Path;

pub use self::properties::{merge_run_props, parse_run_props};
pub use self::run::{InlineConversion, RunConverter};

/// Counts gathered while converting one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub bibliographies: usize,
    /// Distinct citations, counted per bibliography.
    pub citations: usize,
    /// Citations whose key was not found in the database.
    pub dropped_citations: usize,
    /// Source runs that were split to apply inline formatting.
    pub rewritten_runs: usize,
}

/// Splits one run's text into native runs. See [`RunConverter::split`].
pub fn split_run(run_text: &str, inherited: &RunProps) -> Vec<NativeRun> {
    RunConverter::split(run_text, inherited)
}

/// Applies inline formatting tags throughout a document payload.
pub fn convert_inline_markup(xml: &str, sink: &dyn LogSink) -> String {
    RunConverter::convert(xml, sink).xml
}

/// Runs the whole pipeline on a document payload without touching disk.
pub fn convert_document_xml(
    xml: &str,
    db: &dyn BibDatabase,
    style: &StyleSheet,
    sink: &dyn LogSink,
) -> Result<(String, ConversionReport)> {
    let (bibliographies, text) = extract(xml)?;
    render_document(&bibliographies, &text, db, style, sink)
}

fn render_document(
    bibliographies: &Bibliographies,
    text: &str,
    db: &dyn BibDatabase,
    style: &StyleSheet,
    sink: &dyn LogSink,
) -> Result<(String, ConversionReport)> {
    let references = references::generate(bibliographies, db, style, sink)?;
    let filled = fill_placeholders(text, references.values());
    let inline = RunConverter::convert(&filled, sink);

    let report = ConversionReport {
        bibliographies: bibliographies.len(),
        citations: bibliographies.citation_count(),
        dropped_citations: references.dropped().len(),
        rewritten_runs: inline.rewritten_runs,
    };
    Ok((inline.xml, report))
}

/// Orchestrates citation processing of `.docx` files.
pub struct CitationProcessor<'a> {
    options: ConvertOptions,
    sink: &'a dyn LogSink,
}

impl<'a> CitationProcessor<'a> {
    /// Creates a new processor with the given options.
    pub fn new(options: ConvertOptions, sink: &'a dyn LogSink) -> Self {
        Self { options, sink }
    }

    /// Creates a new processor with default options.
    pub fn with_defaults(sink: &'a dyn LogSink) -> Self {
        Self::new(ConvertOptions::default(), sink)
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Styles from the configured style sheet, or the builtin ones.
    pub fn catalog(&self) -> Result<StyleCatalog> {
        match &self.options.styles_file {
            Some(path) => StyleCatalog::load(path, self.sink),
            None => StyleCatalog::builtin(self.sink),
        }
    }

    /// Extracts the bibliography and citation markers of `input` without
    /// converting anything.
    pub fn markers<P: AsRef<Path>>(&self, input: P) -> Result<Bibliographies> {
        let xml = DocxContainer::open(input.as_ref())?.read_document()?;
        let (bibliographies, _) = extract(&xml)?;
        Ok(bibliographies)
    }

    /// Converts `input` into `output` using references from the BibTeX
    /// file at `database`.
    ///
    /// A structurally invalid document fails before the database or style
    /// is loaded, and nothing is written.
    pub fn process<P, D, O>(&self, input: P, database: D, output: O) -> Result<ConversionReport>
    where
        P: AsRef<Path>,
        D: AsRef<Path>,
        O: AsRef<Path>,
    {
        let (input, output) = (input.as_ref(), output.as_ref());

        let container = DocxContainer::open(input)?;
        let xml = container.read_document()?;
        let (bibliographies, text) = extract(&xml)?;

        let db = BibTexDatabase::load(database, self.sink)?;
        let catalog = self.catalog()?;
        let style = catalog.resolve(&self.options.style)?;

        let (document, report) = render_document(&bibliographies, &text, &db, style, self.sink)?;
        container.write_document(&document, output)?;

        if self.options.verify_output {
            verify_docx(output)?;
        }

        self.sink.record(
            LogLevel::Info,
            &format!(
                "{}: {} bibliography(ies), {} citation(s), {} dropped, {} run(s) reformatted",
                input.display(),
                report.bibliographies,
                report.citations,
                report.dropped_citations,
                report.rewritten_runs
            ),
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{BibEntry, FieldValue};
    use crate::error::{Error, ParseFailure};
    use crate::logging::CollectingSink;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn db() -> HashMap<String, BibEntry> {
        let knuth = BibEntry::new("knuth", "book")
            .with("author", FieldValue::List(vec!["Knuth, Donald E.".into()]))
            .with("title", "The Art of Computer Programming".into())
            .with("publisher", "Addison-Wesley".into())
            .with("year", "1968".into());
        [("knuth".to_string(), knuth)].into_iter().collect()
    }

    fn numeric() -> StyleSheet {
        StyleCatalog::builtin(&CollectingSink::new())
            .and_then(|c| c.resolve("numeric").cloned())
            .expect("numeric style")
    }

    #[test]
    fn test_document_xml_end_to_end() {
        let xml = concat!(
            r#"<w:body><w:p><w:r><w:rPr><w:rtl w:val="0"/></w:rPr><w:t>See \cite{knuth}.</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>\bibliography{refs}</w:t></w:r></w:p></w:body>"#,
        );
        let sink = CollectingSink::new();
        let (out, report) = convert_document_xml(xml, &db(), &numeric(), &sink).expect("convert");

        assert_eq!(
            report,
            ConversionReport {
                bibliographies: 1,
                citations: 1,
                dropped_citations: 0,
                rewritten_runs: 1,
            }
        );
        assert!(out.contains(r#"<w:t>See [1].</w:t>"#));
        assert!(out.contains(r#"<w:r><w:rPr><w:b w:val="1"/></w:rPr><w:t xml:space="preserve">References</w:t></w:r>"#));
        assert!(out.contains(
            r#"<w:r><w:br/><w:t xml:space="preserve">[1] Knuth, D.E. </w:t></w:r>"#
        ));
        assert!(out.contains(
            r#"<w:r><w:rPr><w:i w:val="1"/></w:rPr><w:t xml:space="preserve">The Art of Computer Programming</w:t></w:r>"#
        ));
        assert!(out.contains("Addison-Wesley, 1968."));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_unknown_citation_renders_empty() {
        let xml = r#"<w:t>a\cite{nobody}b \bibliography{r}</w:t>"#;
        let sink = CollectingSink::new();
        let (out, report) = convert_document_xml(xml, &db(), &numeric(), &sink).expect("convert");
        assert!(out.starts_with("<w:t>ab "));
        assert_eq!(report.dropped_citations, 1);
        assert_eq!(sink.messages_at(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn test_leading_bibliography_aborts() {
        let err = convert_document_xml(r"\bib{r} \cite{knuth}", &db(), &numeric(), &CollectingSink::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Citation(ParseFailure::LeadingBibliography { .. })
        ));
    }

    #[test]
    fn test_document_without_markers_passes_through() {
        let xml = r#"<w:p><w:r><w:t>nothing to see</w:t></w:r></w:p>"#;
        let (out, report) =
            convert_document_xml(xml, &db(), &numeric(), &CollectingSink::new()).expect("convert");
        assert_eq!(out, xml);
        assert_eq!(report, ConversionReport::default());
    }
}
