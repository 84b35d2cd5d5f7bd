//! Emission of native runs as WordprocessingML.

use super::escape_xml_attr;
use crate::core::{NativeRun, RunContent, RunProps};

/// Opening tag used when no source run supplies one.
pub const DEFAULT_RUN_OPEN: &str = "<w:r>";

/// Child order of `w:rPr` (CT_RPr). Unlisted children follow these, and a
/// tracked `rPrChange` always comes last.
const SCHEMA_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

fn schema_rank(name: &str) -> usize {
    if name == "rPrChange" {
        return SCHEMA_ORDER.len() + 1;
    }
    SCHEMA_ORDER
        .iter()
        .position(|known| *known == name)
        .unwrap_or(SCHEMA_ORDER.len())
}

/// Renders a `<w:rPr>` block, or an empty string when there is nothing to set.
///
/// Props that were parsed and never modified are emitted exactly as read.
/// Otherwise children follow the schema order, with raw properties of equal
/// rank kept in source order.
pub fn render_run_props(props: &RunProps) -> String {
    if let Some(source) = props.source() {
        return source.to_string();
    }
    if props.is_empty() {
        return String::new();
    }

    let mut children: Vec<(usize, String)> = props
        .extra
        .iter()
        .map(|raw| (schema_rank(&raw.name), raw.xml.clone()))
        .collect();
    if props.bold {
        children.push((schema_rank("b"), r#"<w:b w:val="1"/>"#.to_string()));
    }
    if props.italic {
        children.push((schema_rank("i"), r#"<w:i w:val="1"/>"#.to_string()));
    }
    if let Some(color) = &props.color {
        children.push((
            schema_rank("color"),
            format!(r#"<w:color w:val="{}"/>"#, escape_xml_attr(color)),
        ));
    }
    if let Some(size) = &props.size {
        let size = escape_xml_attr(size);
        children.push((schema_rank("sz"), format!(r#"<w:sz w:val="{}"/>"#, size)));
        children.push((schema_rank("szCs"), format!(r#"<w:szCs w:val="{}"/>"#, size)));
    }
    if let Some(style) = &props.underline {
        children.push((
            schema_rank("u"),
            format!(r#"<w:u w:val="{}"/>"#, escape_xml_attr(style)),
        ));
    }
    children.sort_by_key(|(rank, _)| *rank);

    let mut out = String::from("<w:rPr>");
    for (_, xml) in children {
        out.push_str(&xml);
    }
    out.push_str("</w:rPr>");
    out
}

/// Renders one closed `<w:r>` element using `open` as its opening tag.
pub fn render_run(run: &NativeRun, open: &str) -> String {
    let mut out = String::from(open);
    out.push_str(&render_run_props(&run.props));
    match &run.content {
        RunContent::Text(text) => {
            out.push_str(r#"<w:t xml:space="preserve">"#);
            out.push_str(text);
            out.push_str("</w:t>");
        }
        RunContent::Break => out.push_str("<w:br/>"),
    }
    out.push_str("</w:r>");
    out
}

/// Renders a run sequence back to back.
pub fn render_runs(runs: &[NativeRun], open: &str) -> String {
    runs.iter().map(|run| render_run(run, open)).collect()
}
