//! Style template rendering.
//!
//! Templates are literal text with `{{ expr }}` expressions, where `expr` is
//! a variable or a quoted literal followed by `| filter(args)` pipes:
//!
//! ```text
//! [{{ number }}] {{ author|authors_acm|add_chars('. ') }}{{ title|wrap_html('i') }}
//! ```
//!
//! An expression whose variable is missing renders as nothing. Variable
//! values are XML-escaped before any filter runs; literal template text and
//! filter arguments are emitted as written.

use crate::database::FieldValue;
use crate::error::{Error, Result};
use crate::render::escape_xml_text;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Variables visible to a template.
pub type Context = BTreeMap<String, FieldValue>;

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("expression pattern is valid"))
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("variable pattern is valid"))
}

/// Renders `template` against `context`.
pub fn render(template: &str, context: &Context) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in expression_regex().captures_iter(template) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        let expression = Expression::parse(body.as_str())?;
        if let Some(value) = expression.evaluate(context) {
            out.push_str(&value);
        }
    }

    out.push_str(&template[last..]);
    Ok(out)
}

#[derive(Debug, PartialEq)]
enum Head {
    Variable(String),
    Literal(String),
}

#[derive(Debug, PartialEq)]
enum Filter {
    WrapHtml(String),
    AddChars(String),
    AddToFront(String),
    Wrap(String),
    Font { size: String, color: Option<String> },
    GetLast,
    Join(String),
    AuthorsAcm,
    AuthorsApa,
    AuthorsCcsc,
}

#[derive(Debug)]
struct Expression {
    head: Head,
    filters: Vec<Filter>,
}

impl Expression {
    fn parse(source: &str) -> Result<Self> {
        let mut parts = split_top_level(source, '|').into_iter();
        let head = parts.next().unwrap_or_default().trim();

        let head = if let Some(literal) = unquote(head) {
            Head::Literal(literal.to_string())
        } else if variable_regex().is_match(head) {
            Head::Variable(head.to_string())
        } else {
            return Err(Error::Template(format!("invalid expression `{}`", source.trim())));
        };

        let filters = parts.map(|p| Filter::parse(p.trim())).collect::<Result<_>>()?;
        Ok(Self { head, filters })
    }

    fn evaluate(&self, context: &Context) -> Option<String> {
        let mut value = match &self.head {
            Head::Literal(text) => FieldValue::Text(text.clone()),
            Head::Variable(name) => match context.get(name)? {
                FieldValue::Text(text) => FieldValue::Text(escape_xml_text(text)),
                FieldValue::List(items) => {
                    FieldValue::List(items.iter().map(|i| escape_xml_text(i)).collect())
                }
            },
        };
        for filter in &self.filters {
            value = filter.apply(value);
        }
        Some(match value {
            FieldValue::Text(text) => text,
            FieldValue::List(items) => items.join(", "),
        })
    }
}

impl Filter {
    fn parse(source: &str) -> Result<Self> {
        let (name, args) = match source.find('(') {
            Some(open) => {
                let Some(inner) = source[open + 1..].strip_suffix(')') else {
                    return Err(Error::Template(format!("unbalanced filter call `{}`", source)));
                };
                let args: Vec<String> = split_top_level(inner, ',')
                    .into_iter()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(|a| unquote(a).unwrap_or(a).to_string())
                    .collect();
                (source[..open].trim(), args)
            }
            None => (source, Vec::new()),
        };

        let arity = |expected: usize| -> Result<()> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(Error::Template(format!(
                    "filter `{}` expects {} argument(s), got {}",
                    name,
                    expected,
                    args.len()
                )))
            }
        };
        let first = || args.first().cloned().unwrap_or_default();

        let filter = match name {
            "wrap_html" => arity(1).map(|_| Filter::WrapHtml(first()))?,
            "add_chars" => arity(1).map(|_| Filter::AddChars(first()))?,
            "add_to_front" => arity(1).map(|_| Filter::AddToFront(first()))?,
            "wrap" => arity(1).map(|_| Filter::Wrap(first()))?,
            "join" => arity(1).map(|_| Filter::Join(first()))?,
            "font" => match args.as_slice() {
                [size] => Filter::Font {
                    size: size.clone(),
                    color: None,
                },
                [size, color] => Filter::Font {
                    size: size.clone(),
                    color: Some(color.clone()),
                },
                _ => {
                    return Err(Error::Template(
                        "filter `font` expects a size and an optional color".to_string(),
                    ))
                }
            },
            "get_last" => arity(0).map(|_| Filter::GetLast)?,
            "authors_acm" => arity(0).map(|_| Filter::AuthorsAcm)?,
            "authors_apa" => arity(0).map(|_| Filter::AuthorsApa)?,
            "authors_ccsc" => arity(0).map(|_| Filter::AuthorsCcsc)?,
            other => return Err(Error::Template(format!("unknown filter `{}`", other))),
        };
        Ok(filter)
    }

    fn apply(&self, value: FieldValue) -> FieldValue {
        match self {
            Filter::WrapHtml(tag) => per_item(&value, |v| format!("<{tag}>{v}</{tag}>")),
            Filter::AddChars(suffix) => per_item(&value, |v| format!("{v}{suffix}")),
            Filter::AddToFront(prefix) => per_item(&value, |v| format!("{prefix}{v}")),
            Filter::Wrap(c) => {
                let (open, close) = match c.as_str() {
                    "(" | ")" => ("(", ")"),
                    "[" | "]" => ("[", "]"),
                    other => (other, other),
                };
                per_item(&value, |v| format!("{open}{v}{close}"))
            }
            Filter::Font { size, color } => per_item(&value, |v| match color {
                Some(color) => format!(r#"<font size="{size}" color="{color}">{v}</font>"#),
                None => format!(r#"<font size="{size}">{v}</font>"#),
            }),
            Filter::GetLast => FieldValue::Text(PersonName::parse(value.first()).last),
            Filter::Join(sep) => match value {
                FieldValue::List(items) => FieldValue::Text(items.join(sep)),
                text => text,
            },
            Filter::AuthorsAcm => {
                let names: Vec<String> = value.items().into_iter().map(|n| PersonName::parse(n).compact()).collect();
                FieldValue::Text(join_names(&names, ", ", " and "))
            }
            Filter::AuthorsApa => {
                let names: Vec<String> = value.items().into_iter().map(|n| PersonName::parse(n).spaced()).collect();
                let joined = match names.as_slice() {
                    [] => String::new(),
                    [only] => only.clone(),
                    [init @ .., last] => format!("{}, & {}", init.join(", "), last),
                };
                FieldValue::Text(joined)
            }
            Filter::AuthorsCcsc => per_item(&value, |v| format!("{}, ", PersonName::parse(v).last)),
        }
    }
}

fn per_item(value: &FieldValue, f: impl Fn(&str) -> String) -> FieldValue {
    FieldValue::Text(value.items().into_iter().map(f).collect())
}

fn join_names(names: &[String], sep: &str, last_sep: &str) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{}{}{}", init.join(sep), last_sep, last),
    }
}

/// A personal name split into family and given names.
pub(crate) struct PersonName {
    pub(crate) last: String,
    given: String,
}

impl PersonName {
    /// Accepts `Last, First Middle` and `First Middle Last`.
    pub(crate) fn parse(name: &str) -> Self {
        let (last, given) = match name.split_once(',') {
            Some((last, given)) => (last.trim().to_string(), given.trim().to_string()),
            None => {
                let mut words: Vec<&str> = name.split_whitespace().collect();
                let last = words.pop().unwrap_or_default().to_string();
                (last, words.join(" "))
            }
        };
        Self { last, given }
    }

    fn initials(&self) -> Vec<String> {
        self.given
            .split_whitespace()
            .filter_map(|w| w.chars().find(|c| c.is_alphabetic()))
            .map(|c| format!("{c}."))
            .collect()
    }

    /// `Knuth, D.E.`
    fn compact(&self) -> String {
        match self.initials().concat() {
            initials if initials.is_empty() => self.last.clone(),
            initials => format!("{}, {}", self.last, initials),
        }
    }

    /// `Knuth, D. E.`
    fn spaced(&self) -> String {
        match self.initials().join(" ") {
            initials if initials.is_empty() => self.last.clone(),
            initials => format!("{}, {}", self.last, initials),
        }
    }

    /// `Knuth, Donald E.`
    pub(crate) fn family_first(&self) -> String {
        if self.given.is_empty() {
            return self.last.clone();
        }
        format!("{}, {}", self.last, self.given)
    }
}

/// Splits on `sep` outside quotes and parentheses.
fn split_top_level(source: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&source[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn unquote(text: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .filter(|_| text.len() >= 2)
    })
}
