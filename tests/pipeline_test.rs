mod common;

use docxcite::adapters::docx::verify_docx;
use docxcite::{CitationProcessor, CollectingSink, ConvertOptions, Error, LogLevel};
use pretty_assertions::assert_eq;

#[test]
fn test_process_numeric_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(
        &input,
        &[
            r"Structured programming \cite{dijkstra} and analysis \cite{knuth}.",
            r"Again \cite{dijkstra}.",
            r"\bibliography{refs}",
        ],
    );
    let bib = common::write_bib(dir.path());
    let output = dir.path().join("paper-cited.docx");

    let sink = CollectingSink::new();
    let processor = CitationProcessor::with_defaults(&sink);
    let report = processor.process(&input, &bib, &output).expect("process");

    assert_eq!(report.bibliographies, 1);
    assert_eq!(report.citations, 2);
    assert_eq!(report.dropped_citations, 0);

    let xml = common::document_xml(&output);
    assert!(xml.contains("Structured programming [1] and analysis [2]."));
    assert!(xml.contains("Again [1]."));
    assert!(!xml.contains(r"\cite"));
    assert!(!xml.contains(r"\bibliography"));
    assert!(xml.contains(r#"<w:b w:val="1"/>"#));
    assert!(xml.contains("Communications of the ACM"));
    verify_docx(&output).expect("output must load");

    assert_eq!(sink.messages_at(LogLevel::Info).len(), 1);
}

#[test]
fn test_alpha_style_orders_by_author() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(
        &input,
        &[r"\cite{knuth} \cite{adams} \cite{dijkstra}", r"\bib{refs}"],
    );
    let bib = common::write_bib(dir.path());
    let output = dir.path().join("out.docx");

    let sink = CollectingSink::new();
    let options = ConvertOptions {
        style: "Alpha".into(),
        ..Default::default()
    };
    CitationProcessor::new(options, &sink)
        .process(&input, &bib, &output)
        .expect("process");

    let xml = common::document_xml(&output);
    let adams = xml.find("Adams, D.").expect("adams entry");
    let dijkstra = xml.find("Dijkstra, E. W.").expect("dijkstra entry");
    let knuth = xml.find("Knuth, D. E.").expect("knuth entry");
    assert!(adams < dijkstra && dijkstra < knuth);
    assert!(xml.contains("(Knuth, 1968) (Adams, 1992) (Dijkstra, 1968)"));
}

#[test]
fn test_unknown_keys_are_dropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(&input, &[r"A\cite{missing}B\cite{knuth}", r"\bibliography{refs}"]);
    let bib = common::write_bib(dir.path());
    let output = dir.path().join("out.docx");

    let sink = CollectingSink::new();
    let report = CitationProcessor::with_defaults(&sink)
        .process(&input, &bib, &output)
        .expect("process");

    assert_eq!(report.dropped_citations, 1);
    assert!(common::document_xml(&output).contains("AB[1]"));
    let warnings = sink.messages_at(LogLevel::Warn);
    assert!(warnings.iter().any(|w| w.contains("missing")));
}

#[test]
fn test_missing_database_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(&input, &[r"text \cite{knuth}", r"\bibliography{refs}"]);
    let output = dir.path().join("out.docx");

    let sink = CollectingSink::new();
    let err = CitationProcessor::with_defaults(&sink)
        .process(&input, dir.path().join("absent.bib"), &output)
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(!output.exists());
}

#[test]
fn test_malformed_database_is_reported_with_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(&input, &[r"text \cite{knuth}", r"\bibliography{refs}"]);
    let bib = dir.path().join("broken.bib");
    std::fs::write(&bib, "@book{knuth,\n  title = {Unclosed").expect("write bib");

    let sink = CollectingSink::new();
    let err = CitationProcessor::with_defaults(&sink)
        .process(&input, &bib, dir.path().join("out.docx"))
        .unwrap_err();
    assert!(matches!(err, Error::BibParse { line: 1, .. }));
}

#[test]
fn test_custom_style_sheet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(&input, &[r"see \cite{adams}", r"\bibliography{refs}"]);
    let bib = common::write_bib(dir.path());
    let styles = dir.path().join("styles.json");
    std::fs::write(
        &styles,
        r##"{
            "loud": {
                "order": {"method": "cited", "sortby": "author"},
                "in_text_style": {"index": "k", "template": "<font size=\"40\" color=\"#FF0000\">{{ id }}</font>"},
                "title": {"key": "Works", "template": "<u>{{ Works }}</u>"},
                "default_style": "{{ k }}: {{ title }}"
            }
        }"##,
    )
    .expect("write styles");
    let output = dir.path().join("out.docx");

    let options = ConvertOptions {
        style: "loud".into(),
        styles_file: Some(styles),
        verify_output: false,
    };
    let sink = CollectingSink::new();
    CitationProcessor::new(options, &sink)
        .process(&input, &bib, &output)
        .expect("process");

    let xml = common::document_xml(&output);
    assert!(xml.contains(
        r#"<w:rPr><w:color w:val="FF0000"/><w:sz w:val="40"/><w:szCs w:val="40"/></w:rPr><w:t xml:space="preserve">adams</w:t>"#
    ));
    assert!(xml.contains(r#"<w:rPr><w:u w:val="single"/></w:rPr><w:t xml:space="preserve">Works</w:t>"#));
    assert!(xml.contains("1: Mostly Harmless"));
}

#[test]
fn test_markers_without_conversion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.docx");
    common::write_docx(&input, &[r"\cite{x}\cite{y}\cite{x}", r"\bib{one}", r"\cite{z}", r"\bib{two}"]);

    let sink = CollectingSink::new();
    let markers = CitationProcessor::with_defaults(&sink)
        .markers(&input)
        .expect("markers");

    assert_eq!(markers.len(), 2);
    assert_eq!(markers.citation_count(), 3);
    let second = markers.get("B1").expect("second bibliography");
    assert_eq!(second.key, "two");
    assert_eq!(second.citations[0].placeholder, "B1C0");
}
