/// Formatting tree built from inline markup such as `<b><i>text</i></b>`.
///
/// Leaves carry no formatting of their own; every property comes from the
/// ancestors that wrap them, applied outer to inner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatNode {
    Leaf(String),
    /// A line break (`<br />`) in the markup.
    Break,
    /// Mixed content inside one tag, e.g. `<b>a <i>b</i> c</b>`.
    Sequence(Vec<FormatNode>),
    Bold(Box<FormatNode>),
    Italic(Box<FormatNode>),
    Underline(Box<FormatNode>),
    Font {
        size: Option<String>,
        color: Option<String>,
        child: Box<FormatNode>,
    },
}

impl FormatNode {
    /// Concatenated leaf text, with every tag removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            FormatNode::Leaf(text) => out.push_str(text),
            FormatNode::Break => {}
            FormatNode::Sequence(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            FormatNode::Bold(child)
            | FormatNode::Italic(child)
            | FormatNode::Underline(child)
            | FormatNode::Font { child, .. } => child.collect_text(out),
        }
    }

    /// Returns true when the tree carries no formatting at all.
    pub fn is_plain(&self) -> bool {
        match self {
            FormatNode::Leaf(_) => true,
            FormatNode::Sequence(children) => children.iter().all(FormatNode::is_plain),
            _ => false,
        }
    }
}

/// A single child of a `<w:rPr>` block kept as raw markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    /// Element name, e.g. `rtl`. The `w:` prefix is dropped; other prefixes
    /// are kept (`w14:ligatures`).
    pub name: String,
    pub xml: String,
}

/// Character formatting of a native run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProps {
    pub bold: bool,
    pub italic: bool,
    /// Underline style (`single`, `double`, ...).
    pub underline: Option<String>,
    /// Font size in half-points, as written in `w:sz`.
    pub size: Option<String>,
    /// Hex color without the leading `#`.
    pub color: Option<String>,
    /// Inherited properties this crate does not interpret, in source order.
    pub extra: Vec<RawProperty>,
    /// Original `<w:rPr>` markup when these props were parsed and not modified.
    pub(crate) source: Option<String>,
}

impl RunProps {
    /// Returns true when nothing would be emitted for these props.
    pub fn is_empty(&self) -> bool {
        !self.bold
            && !self.italic
            && self.underline.is_none()
            && self.size.is_none()
            && self.color.is_none()
            && self.extra.is_empty()
    }

    /// Raw markup this value was parsed from, if unchanged since.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Payload of a native run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// Already XML-escaped text.
    Text(String),
    Break,
}

/// The smallest formatted unit of WordprocessingML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRun {
    pub props: RunProps,
    pub content: RunContent,
}

impl NativeRun {
    pub fn text(props: RunProps, text: impl Into<String>) -> Self {
        Self {
            props,
            content: RunContent::Text(text.into()),
        }
    }

    pub fn line_break(props: RunProps) -> Self {
        Self {
            props,
            content: RunContent::Break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_flattens_nested_nodes() {
        let node = FormatNode::Bold(Box::new(FormatNode::Sequence(vec![
            FormatNode::Leaf("a ".into()),
            FormatNode::Italic(Box::new(FormatNode::Leaf("b".into()))),
            FormatNode::Break,
            FormatNode::Leaf(" c".into()),
        ])));
        assert_eq!(node.plain_text(), "a b c");
        assert!(!node.is_plain());
    }

    #[test]
    fn test_default_props_are_empty() {
        assert!(RunProps::default().is_empty());
        let props = RunProps {
            bold: true,
            ..Default::default()
        };
        assert!(!props.is_empty());
    }
}
