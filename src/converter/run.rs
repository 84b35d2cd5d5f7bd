//! Run converter - splits native runs whose text carries inline tags.

use super::elements::leading_element;
use super::parse_run_props;
use crate::core::{NativeRun, RunContent, RunProps};
use crate::logging::{LogLevel, LogSink};
use crate::markup::tokenizer::{contains_inline_markup, is_balanced};
use crate::markup::tree::coalesce;
use crate::markup::{build, segments, SegmentKind};
use crate::render::render_run;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn run_boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<w:r(?:\s[^>]*[^/])?>|</w:r>").expect("run boundary pattern is valid")
    })
}

fn text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?:\s[^>]*[^/])?>(.*?)</w:t>").expect("text pattern is valid")
    })
}

/// Result of rewriting a document payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineConversion {
    pub xml: String,
    /// Number of source runs that were split.
    pub rewritten_runs: usize,
}

/// Converter for runs containing inline markup.
pub struct RunConverter;

impl RunConverter {
    /// Splits one run's text into native runs.
    ///
    /// Untagged text keeps `inherited` unchanged; tagged spans get `inherited`
    /// merged with their formatting; line breaks become break runs. Text
    /// without any inline tag comes back as a single run.
    pub fn split(run_text: &str, inherited: &RunProps) -> Vec<NativeRun> {
        if !contains_inline_markup(run_text) {
            return vec![NativeRun::text(inherited.clone(), run_text)];
        }

        let mut runs = Vec::new();
        for segment in segments(run_text) {
            match segment.kind {
                SegmentKind::Break => runs.push(NativeRun::line_break(inherited.clone())),
                SegmentKind::Plain | SegmentKind::Tagged => {
                    runs.extend(build(segment.text).to_runs(inherited))
                }
            }
        }
        coalesce(runs)
    }

    /// Rewrites every run of a WordprocessingML payload whose text contains
    /// inline tags. All other bytes are copied unchanged.
    pub fn convert(xml: &str, sink: &dyn LogSink) -> InlineConversion {
        let mut out = String::with_capacity(xml.len());
        let mut last = 0;
        let mut rewritten_runs = 0;

        for span in innermost_runs(xml) {
            let open = &xml[span.open.clone()];
            let body = &xml[span.open.end..span.close_start];
            if let Some(replacement) = Self::rewrite_run(open, body, sink) {
                out.push_str(&xml[last..span.open.start]);
                out.push_str(&replacement);
                last = span.end;
                rewritten_runs += 1;
            }
        }

        out.push_str(&xml[last..]);
        InlineConversion {
            xml: out,
            rewritten_runs,
        }
    }

    fn rewrite_run(open: &str, body: &str, sink: &dyn LogSink) -> Option<String> {
        let (rpr, rest) = match leading_element(body).filter(|span| span.name == "w:rPr") {
            Some(span) => (&body[span.outer.clone()], &body[span.outer.end..]),
            None => ("", body),
        };

        let tagged = text_regex()
            .captures_iter(rest)
            .any(|caps| caps.get(1).is_some_and(|m| contains_inline_markup(m.as_str())));
        if !tagged {
            return None;
        }

        let inherited = if rpr.is_empty() {
            RunProps::default()
        } else {
            parse_run_props(rpr)
        };
        let mut assembler = RunAssembler::new(open, rpr);
        let mut last = 0;

        for caps in text_regex().captures_iter(rest) {
            let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            assembler.pending.push_str(&rest[last..whole.start()]);
            last = whole.end();

            let content = content.as_str();
            if !contains_inline_markup(content) {
                assembler.pending.push_str(whole.as_str());
                continue;
            }
            if !is_balanced(content) {
                sink.record(
                    LogLevel::Debug,
                    &format!("recovered malformed inline markup in `{}`", content),
                );
            }

            for run in Self::split(content, &inherited) {
                if run.props == inherited {
                    assembler.keep(&run.content);
                } else {
                    assembler.emit(&run);
                }
            }
        }

        assembler.pending.push_str(&rest[last..]);
        Some(assembler.finish())
    }
}

struct RunSpan {
    open: Range<usize>,
    close_start: usize,
    end: usize,
}

/// Runs that contain no other run, in document order.
///
/// Runs nested through drawings or text boxes are handled at the innermost
/// level only, so a rewrite never cuts through an enclosing run.
fn innermost_runs(xml: &str) -> Vec<RunSpan> {
    let mut spans = Vec::new();
    let mut stack: Vec<(Range<usize>, bool)> = Vec::new();

    for m in run_boundary_regex().find_iter(xml) {
        if m.as_str() == "</w:r>" {
            if let Some((open, nested)) = stack.pop() {
                if !nested {
                    spans.push(RunSpan {
                        open,
                        close_start: m.start(),
                        end: m.end(),
                    });
                }
            }
        } else {
            if let Some(parent) = stack.last_mut() {
                parent.1 = true;
            }
            stack.push((m.range(), false));
        }
    }

    spans
}

/// Collects the replacement for one source run.
///
/// Untagged pieces accumulate in `pending` and are wrapped in a run carrying
/// the source properties verbatim; tagged pieces flush `pending` and are
/// emitted as standalone runs.
struct RunAssembler<'a> {
    open: &'a str,
    rpr: &'a str,
    out: String,
    pending: String,
}

impl<'a> RunAssembler<'a> {
    fn new(open: &'a str, rpr: &'a str) -> Self {
        Self {
            open,
            rpr,
            out: String::new(),
            pending: String::new(),
        }
    }

    fn keep(&mut self, content: &RunContent) {
        match content {
            RunContent::Text(text) => {
                self.pending.push_str(r#"<w:t xml:space="preserve">"#);
                self.pending.push_str(text);
                self.pending.push_str("</w:t>");
            }
            RunContent::Break => self.pending.push_str("<w:br/>"),
        }
    }

    fn emit(&mut self, run: &NativeRun) {
        self.flush();
        self.out.push_str(&render_run(run, self.open));
    }

    fn flush(&mut self) {
        if !self.pending.trim().is_empty() {
            self.out.push_str(self.open);
            self.out.push_str(self.rpr);
            self.out.push_str(&self.pending);
            self.out.push_str("</w:r>");
        }
        self.pending.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}
