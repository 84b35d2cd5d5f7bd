//! Citation extraction, reference generation and placeholder substitution.

pub mod parser;
pub mod references;

pub use parser::{extract, placeholder_token};
pub use references::{generate, ReferenceData};

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*(B\d+(?:C\d+)?)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Replaces every `{{ B<n> }}` and `{{ B<n>C<m> }}` token with its value.
///
/// A placeholder without a value renders as the empty string. Other
/// `{{ ... }}` text is left alone.
pub fn fill_placeholders(text: &str, values: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fill_known_and_missing_placeholders() {
        let values: HashMap<String, String> = [
            ("B0C0".to_string(), "[1]".to_string()),
            ("B0".to_string(), "<b>Refs</b>".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            fill_placeholders("a {{ B0C0 }} b {{B0C1}} c {{ B0 }} {{ other }}", &values),
            "a [1] b  c <b>Refs</b> {{ other }}"
        );
    }

    #[test]
    fn test_extract_then_fill_removes_every_token() {
        let (_, text) = extract(r"x \cite{a} y \bibliography{r} z").expect("parse");
        assert_eq!(fill_placeholders(&text, &HashMap::new()), "x  y  z");
    }
}
