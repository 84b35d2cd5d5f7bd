//! Citation styles.
//!
//! A style sheet file is a JSON object mapping style names to style
//! definitions. Two styles, `numeric` and `alpha`, are built in.

pub mod template;

use crate::error::{Error, Result};
use crate::logging::{LogLevel, LogSink};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use template::{render, Context};
pub(crate) use template::PersonName;

const BUILTIN_STYLES: &str = include_str!("builtin_styles.json");

/// How citations are ordered inside a bibliography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OrderMethod {
    /// Sort by the `sortby` field.
    Alpha,
    /// Keep document order. Any method name other than `alpha` means this.
    Cited,
}

impl From<String> for OrderMethod {
    fn from(method: String) -> Self {
        if method.eq_ignore_ascii_case("alpha") {
            OrderMethod::Alpha
        } else {
            OrderMethod::Cited
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub method: OrderMethod,
    pub sortby: String,
}

/// In-text citation format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InTextStyle {
    /// Variable name the citation number is bound to.
    pub index: String,
    pub template: String,
}

/// Heading rendered at the top of each bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TitleStyle {
    /// Variable bound to its own name while rendering `template`.
    pub key: String,
    pub template: String,
}

/// Entry template for a family of entry types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtendedStyle {
    #[serde(default)]
    pub preferred: Vec<String>,
    #[serde(default)]
    pub supported: Vec<String>,
    pub template: String,
}

/// One complete citation style.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleSheet {
    pub order: Order,
    pub in_text_style: InTextStyle,
    pub title: TitleStyle,
    pub default_style: String,
    #[serde(default)]
    pub extended_styles: BTreeMap<String, ExtendedStyle>,
}

impl StyleSheet {
    /// Selects the entry template for `entry_type`.
    ///
    /// An extended style listing the type as preferred wins over one that
    /// merely supports it; otherwise the default template is used.
    pub fn template_for(&self, entry_type: &str) -> &str {
        let find = |preferred: bool| {
            self.extended_styles
                .values()
                .find(|ext| {
                    let types = if preferred { &ext.preferred } else { &ext.supported };
                    types.iter().any(|t| t.eq_ignore_ascii_case(entry_type))
                })
                .map(|ext| ext.template.as_str())
        };
        find(true)
            .or_else(|| find(false))
            .unwrap_or(self.default_style.as_str())
    }
}

/// Named collection of style sheets.
#[derive(Debug, Clone, Default)]
pub struct StyleCatalog {
    styles: BTreeMap<String, StyleSheet>,
}

impl StyleCatalog {
    /// The styles shipped with the crate.
    pub fn builtin(sink: &dyn LogSink) -> Result<Self> {
        Self::from_json(BUILTIN_STYLES, sink)
    }

    /// Loads a style sheet file.
    pub fn load(path: impl AsRef<Path>, sink: &dyn LogSink) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, sink)
    }

    /// Parses a style sheet document.
    ///
    /// Styles that are missing a required part are skipped with a warning
    /// so one broken definition does not hide the others.
    pub fn from_json(json: &str, sink: &dyn LogSink) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut styles = BTreeMap::new();

        for (name, value) in raw {
            match serde_json::from_value::<StyleSheet>(value) {
                Ok(style) => {
                    styles.insert(name, style);
                }
                Err(e) => sink.record(
                    LogLevel::Warn,
                    &format!("skipping incomplete style `{}`: {}", name, e),
                ),
            }
        }

        Ok(Self { styles })
    }

    /// Style names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.styles.keys().map(String::as_str).collect()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&StyleSheet> {
        self.styles
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, style)| style)
    }

    /// Like [`StyleCatalog::get`], but an unknown name is an error listing
    /// the available styles.
    pub fn resolve(&self, name: &str) -> Result<&StyleSheet> {
        self.get(name).ok_or_else(|| {
            Error::Style(format!(
                "unknown style `{}` (available: {})",
                name,
                self.names().join(", ")
            ))
        })
    }
}
