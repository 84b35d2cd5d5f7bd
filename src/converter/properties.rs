//! Run property parsing and merging.

use super::elements::{leading_element, TopLevelElements};
use crate::core::{RawProperty, RunProps};
use regex::Regex;
use std::sync::OnceLock;

fn val_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"w:val\s*=\s*"([^"]*)""#).expect("val pattern is valid"))
}

fn toggle_on(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

/// Parses a `<w:rPr>` block into [`RunProps`].
///
/// Bold, italic, underline, size and color are interpreted; every other
/// child is kept verbatim in [`RunProps::extra`].
pub fn parse_run_props(rpr: &str) -> RunProps {
    let mut props = RunProps {
        source: Some(rpr.to_string()),
        ..Default::default()
    };

    let Some(block) = leading_element(rpr).filter(|span| span.name == "w:rPr") else {
        return props;
    };
    let body = &rpr[block.inner];
    let mut size_cs = None;

    for child in TopLevelElements::new(body) {
        let xml = &body[child.outer.clone()];
        // Only direct `w:` children carry live formatting. Tracked changes
        // and extension elements are kept whole.
        let name = match child.prefix() {
            Some("w") => child.local_name(),
            _ => child.name,
        };
        let val = val_regex()
            .captures(&xml[..child.inner.start - child.outer.start])
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        match name {
            "b" => props.bold = toggle_on(val),
            "i" => props.italic = toggle_on(val),
            "u" => {
                props.underline = match val {
                    Some("none") => None,
                    Some(style) => Some(style.to_string()),
                    None => Some("single".to_string()),
                }
            }
            "sz" => props.size = val.map(str::to_string),
            "szCs" => {
                size_cs = Some(RawProperty {
                    name: name.to_string(),
                    xml: xml.to_string(),
                })
            }
            "color" => props.color = val.map(str::to_string),
            _ => props.extra.push(RawProperty {
                name: name.to_string(),
                xml: xml.to_string(),
            }),
        }
    }

    // szCs is re-emitted from sz; keep it only when there is no sz to follow.
    if props.size.is_none() {
        if let Some(raw) = size_cs {
            props.extra.push(raw);
        }
    }

    props
}

/// Returns a new property set where `overlay` overrides `base`.
///
/// Toggles that `overlay` switches on win; unset values fall back to `base`.
/// Raw properties of `overlay` replace same-named ones from `base`.
pub fn merge_run_props(base: &RunProps, overlay: &RunProps) -> RunProps {
    let mut merged = base.clone();
    merged.source = None;

    if overlay.bold {
        merged.bold = true;
    }
    if overlay.italic {
        merged.italic = true;
    }
    if overlay.underline.is_some() {
        merged.underline = overlay.underline.clone();
    }
    if overlay.size.is_some() {
        merged.size = overlay.size.clone();
    }
    if overlay.color.is_some() {
        merged.color = overlay.color.clone();
    }
    for raw in &overlay.extra {
        if let Some(existing) = merged.extra.iter_mut().find(|e| e.name == raw.name) {
            *existing = raw.clone();
        } else {
            merged.extra.push(raw.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_interprets_known_children() {
        let props = parse_run_props(
            r#"<w:rPr><w:rFonts w:ascii="Arial"/><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:szCs w:val="28"/><w:u w:val="double"/><w:rtl w:val="0"/></w:rPr>"#,
        );
        assert!(props.bold);
        assert!(!props.italic);
        assert_eq!(props.size.as_deref(), Some("28"));
        assert_eq!(props.underline.as_deref(), Some("double"));
        let names: Vec<_> = props.extra.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["rFonts", "rtl"]);
        assert!(props.source().is_some());
    }

    #[test]
    fn test_parse_handles_expanded_children_and_empty_blocks() {
        let props = parse_run_props(r#"<w:rPr><w:rtl w:val="0"></w:rtl></w:rPr>"#);
        assert_eq!(props.extra.len(), 1);
        assert_eq!(props.extra[0].xml, r#"<w:rtl w:val="0"></w:rtl>"#);

        let empty = parse_run_props("<w:rPr/>");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_toggles_inside_tracked_change_are_not_live() {
        let props = parse_run_props(concat!(
            r#"<w:rPr><w:i/><w:rPrChange w:id="1"><w:rPr><w:b/><w:u/></w:rPr></w:rPrChange>"#,
            r#"<w14:ligatures w14:val="none"/></w:rPr>"#,
        ));
        assert!(props.italic);
        assert!(!props.bold);
        assert!(props.underline.is_none());
        let names: Vec<_> = props.extra.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["rPrChange", "w14:ligatures"]);
        assert_eq!(
            props.extra[0].xml,
            r#"<w:rPrChange w:id="1"><w:rPr><w:b/><w:u/></w:rPr></w:rPrChange>"#
        );
    }

    #[test]
    fn test_merge_prefers_overlay_and_keeps_inherited() {
        let base = parse_run_props(r#"<w:rPr><w:sz w:val="20"/><w:rtl w:val="0"/></w:rPr>"#);
        let overlay = RunProps {
            bold: true,
            size: Some("32".into()),
            ..Default::default()
        };
        let merged = merge_run_props(&base, &overlay);
        assert!(merged.bold);
        assert_eq!(merged.size.as_deref(), Some("32"));
        assert_eq!(merged.extra.len(), 1);
        assert!(merged.source().is_none());
    }
}
