//! Markup tokenizer.
//!
//! Recognises the inline format tags (`<b>`, `<i>`, `<u>`, `<font>`, plus
//! `<br />`) inside run text, and the citation structure markers
//! (`\cite{..}`, `\bibliography{..}`, `\bib{..}`) in document text.

use regex::{Match, Regex};
use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

fn inline_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<\s*(/?)\s*(b|i|u|font|br)\b([^<>]*?)\s*(/?)>")
            .expect("inline tag pattern is valid")
    })
}

fn font_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(size|color)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("font attribute pattern is valid")
    })
}

fn bibliography_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\bibliography\s*\{[^}]*\}|\\bib\s*\{[^}]*\}")
            .expect("bibliography pattern is valid")
    })
}

fn cite_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\\cite\s*\{[^}]*\}").expect("cite pattern is valid"))
}

fn native_markup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?w:[^>]*>").expect("markup pattern is valid"))
}

fn brace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{(.*?)\}").expect("brace pattern is valid"))
}

/// The four inline format tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Bold,
    Italic,
    Underline,
    Font,
}

impl TagKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "b" => Some(TagKind::Bold),
            "i" => Some(TagKind::Italic),
            "u" => Some(TagKind::Underline),
            "font" => Some(TagKind::Font),
            _ => None,
        }
    }
}

/// An opening inline tag with the attributes this crate understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub kind: TagKind,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Open(OpenTag),
    Close(TagKind),
    LineBreak,
}

/// A token together with the byte range it covers in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

/// Splits run text into text and inline tag tokens.
pub fn tokenize(text: &str) -> Vec<Spanned<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in inline_tag_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Spanned {
                token: Token::Text(&text[last..whole.start()]),
                span: last..whole.start(),
            });
        }
        last = whole.end();

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        if name.eq_ignore_ascii_case("br") {
            tokens.push(Spanned {
                token: Token::LineBreak,
                span: whole.range(),
            });
            continue;
        }

        let Some(kind) = TagKind::from_name(name) else {
            continue;
        };
        // `<b/>` formats nothing.
        if self_closing {
            continue;
        }
        let token = if closing {
            Token::Close(kind)
        } else {
            let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            Token::Open(open_tag(kind, attrs))
        };
        tokens.push(Spanned {
            token,
            span: whole.range(),
        });
    }

    if last < text.len() {
        tokens.push(Spanned {
            token: Token::Text(&text[last..]),
            span: last..text.len(),
        });
    }
    tokens
}

fn open_tag(kind: TagKind, attrs: &str) -> OpenTag {
    let mut tag = OpenTag {
        kind,
        size: None,
        color: None,
    };
    if kind != TagKind::Font {
        return tag;
    }

    // Attribute quotes arrive entity-encoded when the tag sits inside XML text.
    let attrs = attrs
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'");

    for caps in font_attr_regex().captures_iter(&attrs) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());
        let Some(value) = value else {
            continue;
        };
        match caps[1].to_ascii_lowercase().as_str() {
            "size" => tag.size = Some(value),
            "color" => tag.color = Some(value.trim_start_matches('#').to_string()),
            _ => {}
        }
    }
    tag
}

/// Returns true when `text` contains at least one inline tag or line break.
pub fn contains_inline_markup(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| !matches!(t.token, Token::Text(_)))
}

/// Returns true when every opened tag is closed in order and no closer is stray.
pub fn is_balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    for spanned in tokenize(text) {
        match spanned.token {
            Token::Open(tag) => stack.push(tag.kind),
            Token::Close(kind) => {
                if stack.pop() != Some(kind) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

/// Kind of a top-level segment of run text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Tagged,
    Break,
}

/// Top-level slice of run text: untagged text, one tagged span, or a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// Partitions run text into alternating untagged and tagged top-level spans.
///
/// A tagged span runs from an opening tag at depth zero to the closer that
/// brings the depth back to zero. A closer that matches an outer tag also
/// closes the inner ones. An unclosed span extends to the end of the text.
/// Stray closers stay inside the surrounding segment. Empty segments are
/// never produced.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<TagKind> = Vec::new();
    let mut plain_start = 0;
    let mut tagged_start = 0;

    for spanned in tokenize(text) {
        match spanned.token {
            Token::Text(_) => {}
            Token::LineBreak => {
                if stack.is_empty() {
                    push_segment(
                        &mut out,
                        text,
                        SegmentKind::Plain,
                        plain_start..spanned.span.start,
                    );
                    push_segment(&mut out, text, SegmentKind::Break, spanned.span.clone());
                    plain_start = spanned.span.end;
                }
            }
            Token::Open(tag) => {
                if stack.is_empty() {
                    push_segment(
                        &mut out,
                        text,
                        SegmentKind::Plain,
                        plain_start..spanned.span.start,
                    );
                    tagged_start = spanned.span.start;
                }
                stack.push(tag.kind);
            }
            Token::Close(kind) => {
                if let Some(pos) = stack.iter().rposition(|k| *k == kind) {
                    stack.truncate(pos);
                    if stack.is_empty() {
                        push_segment(
                            &mut out,
                            text,
                            SegmentKind::Tagged,
                            tagged_start..spanned.span.end,
                        );
                        plain_start = spanned.span.end;
                    }
                }
            }
        }
    }

    if stack.is_empty() {
        push_segment(&mut out, text, SegmentKind::Plain, plain_start..text.len());
    } else {
        push_segment(&mut out, text, SegmentKind::Tagged, tagged_start..text.len());
    }
    out
}

fn push_segment<'a>(
    out: &mut Vec<Segment<'a>>,
    text: &'a str,
    kind: SegmentKind,
    range: Range<usize>,
) {
    if !range.is_empty() {
        out.push(Segment {
            kind,
            text: &text[range],
        });
    }
}

/// One element of a capturing split on bibliography markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
    pub text: &'a str,
    pub is_marker: bool,
}

/// Splits document text on bibliography markers, keeping each marker as its
/// own element.
///
/// The result always alternates text, marker, text, ... and starts and ends
/// with a text element, which may be empty.
pub fn split_bibliography_markers(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in bibliography_regex().find_iter(text) {
        pieces.push(Piece {
            text: &text[last..m.start()],
            is_marker: false,
        });
        pieces.push(Piece {
            text: m.as_str(),
            is_marker: true,
        });
        last = m.end();
    }
    pieces.push(Piece {
        text: &text[last..],
        is_marker: false,
    });
    pieces
}

/// Every `\cite{...}` occurrence in `block`, left to right.
pub fn find_citations(block: &str) -> Vec<Match<'_>> {
    cite_regex().find_iter(block).collect()
}

/// Removes WordprocessingML tags (`<w:...>`, `</w:...>`) from `text`.
pub fn strip_native_markup(text: &str) -> Cow<'_, str> {
    native_markup_regex().replace_all(text, "")
}

/// Extracts the brace content of a marker after stripping native markup.
///
/// `\cite{sm</w:t></w:r><w:r><w:t>ith}` yields `smith`.
pub fn marker_key(marker: &str) -> Option<String> {
    let stripped = strip_native_markup(marker);
    brace_regex()
        .captures(&stripped)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
