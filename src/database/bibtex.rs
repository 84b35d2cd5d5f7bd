//! BibTeX database loader.
//!
//! Understands the subset of BibTeX that reference managers emit:
//! `@type{key, name = {..} | ".." | bare, ...}` with `#` concatenation.
//! `@comment`, `@preamble` and `@string` blocks are skipped; string macros
//! are not expanded.

use super::{BibDatabase, BibEntry, FieldValue};
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LogSink};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn name_separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+and\s+").expect("name separator pattern is valid"))
}

fn accent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"\\(?:([`'"^~=.])\s*(?:\{\s*(\\[ij]|[A-Za-z])\s*\}|(\\[ij]|[A-Za-z]))"#,
            r"|([cvuHkr])(?:\s*\{\s*(\\[ij]|[A-Za-z])\s*\}|\s+([A-Za-z]))",
            r"|(ss|aa|AA|ae|AE|oe|OE|o|O|l|L|i|j)\b)",
        ))
        .expect("accent pattern is valid")
    })
}

/// Accent command, the letters it composes with, their precomposed forms,
/// and the combining mark used for any other letter.
const ACCENTS: &[(char, &str, &str, char)] = &[
    ('\'', "AEIOUYaeiouyCcNnSsZzLlRr", "ÁÉÍÓÚÝáéíóúýĆćŃńŚśŹźĹĺŔŕ", '\u{301}'),
    ('`', "AEIOUaeiou", "ÀÈÌÒÙàèìòù", '\u{300}'),
    ('"', "AEIOUYaeiouy", "ÄËÏÖÜŸäëïöüÿ", '\u{308}'),
    ('^', "AEIOUaeiouCcGgHhJjSsWwYy", "ÂÊÎÔÛâêîôûĈĉĜĝĤĥĴĵŜŝŴŵŶŷ", '\u{302}'),
    ('~', "ANOanoIiUu", "ÃÑÕãñõĨĩŨũ", '\u{303}'),
    ('=', "AEIOUaeiou", "ĀĒĪŌŪāēīōū", '\u{304}'),
    ('.', "CcEeGgIZz", "ĊċĖėĠġİŻż", '\u{307}'),
    ('c', "CcSsTt", "ÇçŞşŢţ", '\u{327}'),
    ('v', "CcDdEeNnRrSsTtZz", "ČčĎďĚěŇňŘřŠšŤťŽž", '\u{30C}'),
    ('u', "AaGgUu", "ĂăĞğŬŭ", '\u{306}'),
    ('H', "OoUu", "ŐőŰű", '\u{30B}'),
    ('k', "AaEe", "ĄąĘę", '\u{328}'),
    ('r', "AaUu", "ÅåŮů", '\u{30A}'),
];

fn accented(accent: char, base: char) -> String {
    let Some((_, bases, composed, mark)) = ACCENTS.iter().find(|(a, ..)| *a == accent) else {
        return base.to_string();
    };
    match bases.chars().position(|b| b == base) {
        Some(index) => composed.chars().nth(index).unwrap_or(base).to_string(),
        None => format!("{base}{mark}"),
    }
}

fn special_letter(command: &str) -> &'static str {
    match command {
        "ss" => "ß",
        "aa" => "å",
        "AA" => "Å",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "o" => "ø",
        "O" => "Ø",
        "l" => "ł",
        "L" => "Ł",
        "i" => "ı",
        _ => "ȷ",
    }
}

/// Replaces LaTeX accent and special-letter commands with Unicode.
fn convert_accents(raw: &str) -> Cow<'_, str> {
    accent_regex().replace_all(raw, |caps: &Captures| {
        if let Some(command) = caps.get(7) {
            return special_letter(command.as_str()).to_string();
        }
        let accent = caps
            .get(1)
            .or_else(|| caps.get(4))
            .and_then(|m| m.as_str().chars().next());
        // `\i` and `\j` stand for their dotless letters under an accent.
        let base = [2, 3, 5, 6]
            .into_iter()
            .find_map(|group| caps.get(group))
            .and_then(|m| m.as_str().chars().last());
        match (accent, base) {
            (Some(accent), Some(base)) => accented(accent, base),
            _ => caps[0].to_string(),
        }
    })
}

/// In-memory BibTeX database keyed by citation key.
#[derive(Debug, Default)]
pub struct BibTexDatabase {
    entries: Vec<BibEntry>,
    index: HashMap<String, usize>,
}

impl BibTexDatabase {
    /// Reads and parses a `.bib` file.
    pub fn load(path: impl AsRef<Path>, sink: &dyn LogSink) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::parse(&source, sink)
    }

    /// Parses BibTeX source text.
    ///
    /// When a key occurs twice the first entry is kept and a warning is
    /// recorded.
    pub fn parse(source: &str, sink: &dyn LogSink) -> Result<Self> {
        let mut db = Self::default();
        let mut scanner = Scanner::new(source);

        while let Some(entry) = scanner.next_entry()? {
            if db.index.contains_key(&entry.key) {
                sink.record(
                    LogLevel::Warn,
                    &format!("duplicate BibTeX key `{}`, keeping the first entry", entry.key),
                );
                continue;
            }
            db.index.insert(entry.key.clone(), db.entries.len());
            db.entries.push(entry);
        }

        sink.record(LogLevel::Debug, &format!("loaded {} BibTeX entries", db.entries.len()));
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.iter()
    }
}

impl BibDatabase for BibTexDatabase {
    fn lookup(&self, key: &str) -> Option<&BibEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn line_at(&self, pos: usize) -> usize {
        self.bytes[..pos.min(self.bytes.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> Error {
        Error::BibParse {
            line: self.line_at(pos),
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    // Stops on an ASCII byte or at the end, so the slice is always on char boundaries.
    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if keep(b)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn next_entry(&mut self) -> Result<Option<BibEntry>> {
        loop {
            let Some(offset) = self.src[self.pos..].find('@') else {
                return Ok(None);
            };
            let start = self.pos + offset;
            self.pos = start + 1;

            let entry_type = self
                .take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
                .to_lowercase();
            self.skip_ws();
            let close = match self.peek() {
                Some(b'{') => b'}',
                Some(b'(') => b')',
                // A stray `@` in free text between entries.
                _ => continue,
            };
            self.pos += 1;

            match entry_type.as_str() {
                "" => continue,
                "comment" | "preamble" | "string" => self.skip_block(start, close)?,
                _ => return self.read_entry(start, entry_type, close).map(Some),
            }
        }
    }

    fn skip_block(&mut self, start: usize, close: u8) -> Result<()> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b if b == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error(start, "unterminated block"))
    }

    fn read_entry(&mut self, start: usize, entry_type: String, close: u8) -> Result<BibEntry> {
        self.skip_ws();
        let key = self
            .take_while(|b| b != b',' && b != close && !b.is_ascii_whitespace())
            .to_string();
        if key.is_empty() {
            return Err(self.error(start, format!("@{} entry without a citation key", entry_type)));
        }
        let mut entry = BibEntry::new(key, entry_type);

        loop {
            self.skip_ws();
            match self.peek() {
                None => {
                    return Err(self.error(start, format!("unterminated entry `{}`", entry.key)));
                }
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(entry);
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name_pos = self.pos;
            let name = self
                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.'))
                .to_lowercase();
            if name.is_empty() {
                return Err(self.error(
                    name_pos,
                    format!("unexpected character in entry `{}`", entry.key),
                ));
            }
            self.skip_ws();
            if self.peek() != Some(b'=') {
                return Err(self.error(name_pos, format!("expected `=` after field `{}`", name)));
            }
            self.pos += 1;

            let raw = self.read_value(start, &entry.key, close)?;
            entry.set(&name, field_value(&name, &raw));
        }
    }

    fn read_value(&mut self, start: usize, key: &str, close: u8) -> Result<String> {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.error(start, format!("unterminated entry `{}`", key))),
                Some(b'{') => value.push_str(self.read_delimited(start, key, b'}')?),
                Some(b'"') => value.push_str(self.read_delimited(start, key, b'"')?),
                Some(_) => {
                    let bare = self.take_while(|b| {
                        b != b',' && b != close && b != b'#' && !b.is_ascii_whitespace()
                    });
                    value.push_str(bare);
                }
            }
            self.skip_ws();
            if self.peek() != Some(b'#') {
                return Ok(value);
            }
            self.pos += 1;
        }
    }

    /// Reads a `{..}` or `".."` value starting at the opening delimiter and
    /// returns its inner text. Braces nest; a quote only ends the value at
    /// brace depth zero.
    fn read_delimited(&mut self, start: usize, key: &str, end: u8) -> Result<&'a str> {
        let open = self.pos;
        self.pos += 1;
        let mut depth = 0usize;

        while let Some(b) = self.peek() {
            match b {
                b'\\' => {
                    self.pos += 2;
                    continue;
                }
                b'{' => depth += 1,
                b'}' if end == b'}' && depth == 0 => {
                    self.pos += 1;
                    return Ok(&self.src[open + 1..self.pos - 1]);
                }
                b'}' => depth = depth.saturating_sub(1),
                b'"' if end == b'"' && depth == 0 => {
                    self.pos += 1;
                    return Ok(&self.src[open + 1..self.pos - 1]);
                }
                _ => {}
            }
            self.pos += 1;
        }

        Err(self.error(start, format!("unterminated entry `{}`", key)))
    }
}

/// Converts accents, removes protective braces, resolves escaped specials,
/// drops any other backslash and folds whitespace.
fn clean_value(raw: &str) -> String {
    let converted = convert_accents(raw);
    let mut out = String::with_capacity(converted.len());
    let mut chars = converted.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if "&%$#_{}".contains(next) => {
                    out.push(next);
                    chars.next();
                }
                _ => {}
            },
            '{' | '}' => {}
            _ => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn field_value(name: &str, raw: &str) -> FieldValue {
    let value = clean_value(raw);
    let items: Vec<String> = match name {
        "author" | "editor" => name_separator_regex()
            .split(&value)
            .map(str::to_string)
            .collect(),
        "keywords" => value
            .split([',', ';'])
            .map(|k| k.trim().to_string())
            .collect(),
        _ => return FieldValue::Text(value),
    };
    FieldValue::List(items.into_iter().filter(|i| !i.is_empty()).collect())
}
