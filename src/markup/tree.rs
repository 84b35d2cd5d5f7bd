//! Format tree builder.
//!
//! A recursive-descent reader over the inline tag tokens. Recovery rules for
//! malformed input:
//! - a closer that matches an enclosing tag also closes every tag opened
//!   inside it,
//! - a tag still open at the end of the fragment is closed there,
//! - a closer with no matching opener is dropped,
//! - text is always kept as leaf text.

use super::tokenizer::{tokenize, OpenTag, Spanned, TagKind, Token};
use crate::converter::merge_run_props;
use crate::core::{FormatNode, NativeRun, RunContent, RunProps};

/// Builds the formatting tree of `fragment`.
///
/// A fragment without any tag yields a single [`FormatNode::Leaf`].
pub fn build(fragment: &str) -> FormatNode {
    let mut parser = TreeParser {
        tokens: tokenize(fragment),
        pos: 0,
        open: Vec::new(),
    };
    let nodes = parser.parse_children();
    collapse(nodes)
}

struct TreeParser<'a> {
    tokens: Vec<Spanned<'a>>,
    pos: usize,
    open: Vec<TagKind>,
}

impl TreeParser<'_> {
    fn parse_children(&mut self) -> Vec<FormatNode> {
        let mut nodes = Vec::new();

        while let Some(spanned) = self.tokens.get(self.pos) {
            match spanned.token.clone() {
                Token::Text(text) => {
                    self.pos += 1;
                    push_text(&mut nodes, text);
                }
                Token::LineBreak => {
                    self.pos += 1;
                    nodes.push(FormatNode::Break);
                }
                Token::Open(tag) => {
                    self.pos += 1;
                    self.open.push(tag.kind);
                    let inner = self.parse_children();
                    self.open.pop();
                    nodes.push(wrap(tag, collapse(inner)));
                }
                Token::Close(kind) => {
                    if self.open.last() == Some(&kind) {
                        self.pos += 1;
                        return nodes;
                    }
                    if self.open.contains(&kind) {
                        // Leave the closer for the enclosing tag it belongs to.
                        return nodes;
                    }
                    self.pos += 1;
                }
            }
        }

        nodes
    }
}

fn push_text(nodes: &mut Vec<FormatNode>, text: &str) {
    if let Some(FormatNode::Leaf(existing)) = nodes.last_mut() {
        existing.push_str(text);
    } else {
        nodes.push(FormatNode::Leaf(text.to_string()));
    }
}

fn collapse(mut nodes: Vec<FormatNode>) -> FormatNode {
    match nodes.len() {
        0 => FormatNode::Leaf(String::new()),
        1 => nodes.remove(0),
        _ => FormatNode::Sequence(nodes),
    }
}

fn wrap(tag: OpenTag, child: FormatNode) -> FormatNode {
    let child = Box::new(child);
    match tag.kind {
        TagKind::Bold => FormatNode::Bold(child),
        TagKind::Italic => FormatNode::Italic(child),
        TagKind::Underline => FormatNode::Underline(child),
        TagKind::Font => FormatNode::Font {
            size: tag.size,
            color: tag.color,
            child,
        },
    }
}

impl FormatNode {
    /// Flattens the tree into native runs.
    ///
    /// Every leaf becomes a run whose properties are `inherited` merged with
    /// the formatting of its ancestors. Empty leaves emit nothing and
    /// neighbouring text runs with identical properties are joined.
    pub fn to_runs(&self, inherited: &RunProps) -> Vec<NativeRun> {
        let mut runs = Vec::new();
        self.emit(inherited, &mut runs);
        coalesce(runs)
    }

    fn emit(&self, props: &RunProps, out: &mut Vec<NativeRun>) {
        match self {
            FormatNode::Leaf(text) => {
                if !text.is_empty() {
                    out.push(NativeRun::text(props.clone(), text.clone()));
                }
            }
            FormatNode::Break => out.push(NativeRun::line_break(props.clone())),
            FormatNode::Sequence(children) => {
                for child in children {
                    child.emit(props, out);
                }
            }
            FormatNode::Bold(child) => {
                let overlay = RunProps {
                    bold: true,
                    ..Default::default()
                };
                child.emit(&merge_run_props(props, &overlay), out);
            }
            FormatNode::Italic(child) => {
                let overlay = RunProps {
                    italic: true,
                    ..Default::default()
                };
                child.emit(&merge_run_props(props, &overlay), out);
            }
            FormatNode::Underline(child) => {
                let overlay = RunProps {
                    underline: Some("single".to_string()),
                    ..Default::default()
                };
                child.emit(&merge_run_props(props, &overlay), out);
            }
            FormatNode::Font { size, color, child } => {
                let overlay = RunProps {
                    size: size.clone(),
                    color: color.clone(),
                    ..Default::default()
                };
                child.emit(&merge_run_props(props, &overlay), out);
            }
        }
    }
}

pub(crate) fn coalesce(runs: Vec<NativeRun>) -> Vec<NativeRun> {
    let mut out: Vec<NativeRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(last) = out.last_mut() {
            if last.props == run.props {
                if let (RunContent::Text(existing), RunContent::Text(text)) =
                    (&mut last.content, &run.content)
                {
                    existing.push_str(text);
                    continue;
                }
            }
        }
        out.push(run);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_run_props, render_runs, DEFAULT_RUN_OPEN};
    use pretty_assertions::assert_eq;

    fn leaf(text: &str) -> Box<FormatNode> {
        Box::new(FormatNode::Leaf(text.to_string()))
    }

    #[test]
    fn test_plain_fragment_is_leaf() {
        assert_eq!(build("no tags here"), FormatNode::Leaf("no tags here".into()));
    }

    #[test]
    fn test_nested_tags_wrap_outer_to_inner() {
        assert_eq!(
            build(r#"<font size="45"><u><b>YES</b></u></font>"#),
            FormatNode::Font {
                size: Some("45".into()),
                color: None,
                child: Box::new(FormatNode::Underline(Box::new(FormatNode::Bold(leaf("YES"))))),
            }
        );
    }

    #[test]
    fn test_mixed_content_becomes_sequence() {
        assert_eq!(
            build("<b>a <i>b</i> c</b>"),
            FormatNode::Bold(Box::new(FormatNode::Sequence(vec![
                FormatNode::Leaf("a ".into()),
                FormatNode::Italic(leaf("b")),
                FormatNode::Leaf(" c".into()),
            ])))
        );
    }

    #[test]
    fn test_recovery_from_malformed_markup() {
        // Overlap: </b> closes the inner <i> as well; the trailing </i> is dropped.
        assert_eq!(
            build("<b>x<i>y</b>z</i>"),
            FormatNode::Sequence(vec![
                FormatNode::Bold(Box::new(FormatNode::Sequence(vec![
                    FormatNode::Leaf("x".into()),
                    FormatNode::Italic(leaf("y")),
                ]))),
                FormatNode::Leaf("z".into()),
            ])
        );
        // Unclosed tags run to the end of the fragment.
        assert_eq!(build("<u>open"), FormatNode::Underline(leaf("open")));
        // Stray closers vanish without splitting the text.
        assert_eq!(build("a</b>b"), FormatNode::Leaf("ab".into()));
    }

    #[test]
    fn test_emission_merges_inherited_props() {
        let inherited = crate::converter::parse_run_props(r#"<w:rPr><w:rtl w:val="0"/></w:rPr>"#);
        let runs = build("<b>bold</b>").to_runs(&inherited);
        assert_eq!(runs.len(), 1);
        assert_eq!(
            render_run_props(&runs[0].props),
            r#"<w:rPr><w:b w:val="1"/><w:rtl w:val="0"/></w:rPr>"#
        );
    }

    #[test]
    fn test_emission_of_mixed_content() {
        let runs = build("<b>a <i>b</i><br/>c</b>").to_runs(&RunProps::default());
        assert_eq!(
            render_runs(&runs, DEFAULT_RUN_OPEN),
            concat!(
                r#"<w:r><w:rPr><w:b w:val="1"/></w:rPr><w:t xml:space="preserve">a </w:t></w:r>"#,
                r#"<w:r><w:rPr><w:b w:val="1"/><w:i w:val="1"/></w:rPr><w:t xml:space="preserve">b</w:t></w:r>"#,
                r#"<w:r><w:rPr><w:b w:val="1"/></w:rPr><w:br/></w:r>"#,
                r#"<w:r><w:rPr><w:b w:val="1"/></w:rPr><w:t xml:space="preserve">c</w:t></w:r>"#,
            )
        );
    }

    #[test]
    fn test_font_color_and_size() {
        let runs = build(r##"<font color="#00FF00" size="30">g</font>"##).to_runs(&RunProps::default());
        assert_eq!(
            render_run_props(&runs[0].props),
            r#"<w:rPr><w:color w:val="00FF00"/><w:sz w:val="30"/><w:szCs w:val="30"/></w:rPr>"#
        );
    }
}
