//! Reference data generation.
//!
//! Turns the parsed bibliographies into the text each placeholder stands
//! for: a numbered in-text citation for every `B<n>C<m>` and a formatted
//! reference list for every `B<n>`.

use crate::core::{Bibliographies, Citation};
use crate::database::{BibDatabase, BibEntry, FieldValue};
use crate::error::Result;
use crate::logging::{LogLevel, LogSink};
use crate::style::{render, Context, OrderMethod, PersonName, StyleSheet};
use std::collections::HashMap;

/// Separator between the title and entries of a rendered bibliography.
pub const ENTRY_SEPARATOR: &str = "<br />";

/// Rendered text for every resolvable placeholder.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    values: HashMap<String, String>,
    dropped: Vec<String>,
}

impl ReferenceData {
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }

    /// Placeholder name to rendered text.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Keys of citations that were not found in the database.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }
}

/// Renders in-text citations and reference lists for `bibliographies`.
///
/// Citations whose key is missing from `db` are logged and dropped; their
/// placeholders get no value. Numbering restarts at 1 for every
/// bibliography.
pub fn generate(
    bibliographies: &Bibliographies,
    db: &dyn BibDatabase,
    style: &StyleSheet,
    sink: &dyn LogSink,
) -> Result<ReferenceData> {
    let mut data = ReferenceData::default();

    for bibliography in bibliographies {
        let mut resolved: Vec<(&Citation, &BibEntry)> = Vec::new();
        for citation in &bibliography.citations {
            match db.lookup(&citation.key) {
                Some(entry) => resolved.push((citation, entry)),
                None => {
                    sink.record(
                        LogLevel::Warn,
                        &format!(
                            "citation key `{}` ({}) not found in the database, dropping it",
                            citation.key, citation.placeholder
                        ),
                    );
                    data.dropped.push(citation.key.clone());
                }
            }
        }

        if style.order.method == OrderMethod::Alpha {
            resolved.sort_by_cached_key(|(_, entry)| sort_key(entry, &style.order.sortby));
        }

        let mut parts = Vec::with_capacity(resolved.len() + 1);
        let mut title_context = Context::new();
        title_context.insert(
            style.title.key.clone(),
            FieldValue::Text(style.title.key.clone()),
        );
        parts.push(render(&style.title.template, &title_context)?);

        for (position, (citation, entry)) in resolved.iter().enumerate() {
            let context = entry_context(entry, &style.in_text_style.index, position + 1);
            data.values.insert(
                citation.placeholder.clone(),
                render(&style.in_text_style.template, &context)?,
            );
            parts.push(render(style.template_for(&entry.entry_type), &context)?);
        }

        parts.retain(|part| !part.is_empty());
        data.values
            .insert(bibliography.placeholder.clone(), parts.join(ENTRY_SEPARATOR));
        sink.record(
            LogLevel::Debug,
            &format!(
                "{}: {} reference(s) rendered",
                bibliography.placeholder,
                resolved.len()
            ),
        );
    }

    Ok(data)
}

/// Template variables for one entry: its fields, `entrytype`, `id`, and
/// the citation number under `index_name`.
fn entry_context(entry: &BibEntry, index_name: &str, number: usize) -> Context {
    let mut context: Context = entry
        .fields()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    context.insert("entrytype".to_string(), FieldValue::from(entry.entry_type.as_str()));
    context.insert("id".to_string(), FieldValue::from(entry.key.as_str()));
    context.insert(index_name.to_string(), FieldValue::Text(number.to_string()));
    context
}

fn sort_key(entry: &BibEntry, sortby: &str) -> String {
    let field = |name: &str| entry.get(name).map(|v| v.first().to_string());
    let names = || entry.get("author").map(names_key);
    let key = match sortby {
        "author" => names().or_else(|| field("title")),
        "title" => field("title").or_else(names),
        other => field(other),
    };
    key.or_else(|| entry.fields().next().map(|(_, v)| v.first().to_string()))
        .unwrap_or_default()
        .to_lowercase()
}

/// Authors in `Last, First` form, so names sort by family name.
fn names_key(authors: &FieldValue) -> String {
    authors
        .items()
        .into_iter()
        .map(|name| PersonName::parse(name).family_first())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::extract;
    use crate::logging::CollectingSink;
    use crate::style::StyleCatalog;
    use pretty_assertions::assert_eq;

    fn style(method: &str, sortby: &str) -> StyleSheet {
        let json = format!(
            r#"{{"test": {{
                "order": {{"method": "{method}", "sortby": "{sortby}"}},
                "in_text_style": {{"index": "n", "template": "[{{{{ n }}}}]"}},
                "title": {{"key": "Refs", "template": "<b>{{{{ Refs }}}}</b>"}},
                "default_style": "{{{{ n }}}}. {{{{ title }}}}",
                "extended_styles": {{
                    "books": {{"preferred": ["book"], "template": "{{{{ n }}}}. <i>{{{{ title }}}}</i>"}}
                }}
            }}}}"#
        );
        let catalog = StyleCatalog::from_json(&json, &CollectingSink::new()).expect("style");
        catalog.resolve("test").expect("test style").clone()
    }

    fn entry(key: &str, entry_type: &str, author: Option<&str>, title: &str) -> (String, BibEntry) {
        let mut e = BibEntry::new(key, entry_type).with("title", title.into());
        if let Some(author) = author {
            e.set("author", FieldValue::List(vec![author.to_string()]));
        }
        (key.to_string(), e)
    }

    fn db() -> HashMap<String, BibEntry> {
        [
            entry("zed", "article", Some("Zed, Anna"), "Last Things"),
            entry("adams", "book", Some("adams, Bo"), "First Things"),
            entry("noauthor", "misc", None, "Middle Things"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_cited_order_numbers_in_document_order() {
        let (bibs, _) = extract(r"\cite{zed} \cite{adams} \cite{zed}\bibliography{r}").expect("parse");
        let data = generate(&bibs, &db(), &style("cited", "author"), &CollectingSink::new()).expect("generate");

        assert_eq!(data.get("B0C0"), Some("[1]"));
        assert_eq!(data.get("B0C1"), Some("[2]"));
        assert_eq!(
            data.get("B0"),
            Some("<b>Refs</b><br />1. Last Things<br />2. <i>First Things</i>")
        );
    }

    #[test]
    fn test_alpha_order_is_case_insensitive_with_title_fallback() {
        let (bibs, _) = extract(r"\cite{zed}\cite{noauthor}\cite{adams}\bib{r}").expect("parse");
        let data = generate(&bibs, &db(), &style("alpha", "author"), &CollectingSink::new()).expect("generate");

        // adams < "middle things" (title fallback) < zed
        assert_eq!(data.get("B0C2"), Some("[1]"));
        assert_eq!(data.get("B0C1"), Some("[2]"));
        assert_eq!(data.get("B0C0"), Some("[3]"));
    }

    #[test]
    fn test_alpha_order_sorts_by_family_name() {
        let db: HashMap<String, BibEntry> = [
            entry("turing", "article", Some("Alan Turing"), "Computable Numbers"),
            entry("knuth", "book", Some("Donald Knuth"), "Literate Programming"),
            entry("hopper", "article", Some("Hopper, Grace"), "Compilers"),
        ]
        .into_iter()
        .collect();
        let (bibs, _) = extract(r"\cite{turing}\cite{knuth}\cite{hopper}\bib{r}").expect("parse");
        let data = generate(&bibs, &db, &style("alpha", "author"), &CollectingSink::new()).expect("generate");

        assert_eq!(data.get("B0C2"), Some("[1]"));
        assert_eq!(data.get("B0C1"), Some("[2]"));
        assert_eq!(data.get("B0C0"), Some("[3]"));
    }

    #[test]
    fn test_alpha_ties_keep_document_order() {
        let mut db = db();
        let (key, twin) = entry("zed2", "article", Some("Zed, Anna"), "Other");
        db.insert(key, twin);
        let (bibs, _) = extract(r"\cite{zed2}\cite{zed}\bib{r}").expect("parse");
        let data = generate(&bibs, &db, &style("alpha", "author"), &CollectingSink::new()).expect("generate");
        assert_eq!(data.get("B0C0"), Some("[1]"));
        assert_eq!(data.get("B0C1"), Some("[2]"));
    }

    #[test]
    fn test_unknown_keys_are_dropped_and_logged() {
        let (bibs, _) = extract(r"\cite{ghost}\cite{zed}\bibliography{r}").expect("parse");
        let sink = CollectingSink::new();
        let data = generate(&bibs, &db(), &style("cited", "author"), &sink).expect("generate");

        assert_eq!(data.get("B0C0"), None);
        assert_eq!(data.get("B0C1"), Some("[1]"));
        assert_eq!(data.dropped(), ["ghost".to_string()]);
        assert_eq!(data.get("B0"), Some("<b>Refs</b><br />1. Last Things"));

        let warnings = sink.messages_at(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));
    }

    #[test]
    fn test_numbering_restarts_per_bibliography() {
        let (bibs, _) = extract(r"\cite{zed}\bib{one} \cite{adams}\cite{zed}\bib{two}").expect("parse");
        let data = generate(&bibs, &db(), &style("cited", "title"), &CollectingSink::new()).expect("generate");
        assert_eq!(data.get("B0C0"), Some("[1]"));
        assert_eq!(data.get("B1C0"), Some("[1]"));
        assert_eq!(data.get("B1C1"), Some("[2]"));
    }

    #[test]
    fn test_empty_bibliography_renders_title_only() {
        let (bibs, _) = extract(r"nothing cited \bib{r}").expect("parse");
        let data = generate(&bibs, &db(), &style("cited", "author"), &CollectingSink::new()).expect("generate");
        assert_eq!(data.get("B0"), Some("<b>Refs</b>"));
    }

    #[test]
    fn test_context_exposes_type_and_key() {
        let (_, e) = entry("adams", "book", None, "T");
        let ctx = entry_context(&e, "num", 4);
        assert_eq!(ctx.get("entrytype"), Some(&FieldValue::from("book")));
        assert_eq!(ctx.get("id"), Some(&FieldValue::from("adams")));
        assert_eq!(ctx.get("num"), Some(&FieldValue::from("4")));
    }
}
