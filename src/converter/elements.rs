//! Depth-aware scanning of XML fragments.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::ops::Range;

/// A top-level element of a fragment, located by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan<'a> {
    /// Qualified name, e.g. `w:rPr` or `w14:ligatures`.
    pub name: &'a str,
    /// The whole element, tags included.
    pub outer: Range<usize>,
    /// Content between the start and end tag; empty for `<x/>`.
    pub inner: Range<usize>,
}

impl<'a> ElementSpan<'a> {
    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &'a str {
        self.name.rsplit(':').next().unwrap_or(self.name)
    }

    /// Prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&'a str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }
}

/// Iterates the elements of `source` that are not nested in another element.
///
/// Scanning stops quietly at the first ill-formed construct, so a fragment
/// whose tail is not XML still yields the elements in front of it.
pub struct TopLevelElements<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    done: bool,
}

impl<'a> TopLevelElements<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            reader: Reader::from_str(source),
            done: false,
        }
    }

    fn name_at(&self, start: usize) -> &'a str {
        let tag = &self.source[start + 1..];
        let end = tag
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(tag.len());
        &tag[..end]
    }
}

impl<'a> Iterator for TopLevelElements<'a> {
    type Item = ElementSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut depth = 0usize;
        let mut start = 0;
        let mut inner_start = 0;

        while !self.done {
            let offset = self.reader.buffer_position() as usize;
            match self.reader.read_event() {
                Ok(Event::Start(_)) => {
                    if depth == 0 {
                        start = offset;
                        inner_start = self.reader.buffer_position() as usize;
                    }
                    depth += 1;
                }
                Ok(Event::Empty(_)) if depth == 0 => {
                    let end = self.reader.buffer_position() as usize;
                    return Some(ElementSpan {
                        name: self.name_at(offset),
                        outer: offset..end,
                        inner: end..end,
                    });
                }
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        self.done = true;
                        break;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return Some(ElementSpan {
                            name: self.name_at(start),
                            outer: start..self.reader.buffer_position() as usize,
                            inner: inner_start..offset,
                        });
                    }
                }
                Ok(Event::Eof) | Err(_) => self.done = true,
                Ok(_) => {}
            }
        }
        None
    }
}

/// The element that opens `fragment` when only whitespace precedes it.
pub fn leading_element(fragment: &str) -> Option<ElementSpan<'_>> {
    TopLevelElements::new(fragment)
        .next()
        .filter(|span| fragment[..span.outer.start].trim().is_empty())
}
