//! Bibliography database access.

mod bibtex;

pub use bibtex::BibTexDatabase;

/// Value of a database field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Multi-valued fields such as `author` or `keywords`.
    List(Vec<String>),
}

impl FieldValue {
    /// Items of the value; a text value is a single item.
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(text) => vec![text.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// First item, used as a sort key.
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::List(items) => items.first().map(String::as_str).unwrap_or_default(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One reference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    /// Lowercased entry type (`article`, `book`, ...).
    pub entry_type: String,
    fields: Vec<(String, FieldValue)>,
}

impl BibEntry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into().to_lowercase(),
            fields: Vec::new(),
        }
    }

    /// Sets a field; names are case-insensitive and a later value replaces an earlier one.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        let name = name.to_lowercase();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let name = name.to_lowercase();
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Fields in source order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Keyed store of reference metadata.
pub trait BibDatabase {
    fn lookup(&self, key: &str) -> Option<&BibEntry>;
}

impl BibDatabase for std::collections::HashMap<String, BibEntry> {
    fn lookup(&self, key: &str) -> Option<&BibEntry> {
        self.get(key)
    }
}
