//! # Style Resolver
//!
//! Flattens a paragraph's styled-text tree into a [`CharacterStream`], giving
//! every character the attributes it inherits from its ancestors.
//!
//! ## Inheritance Rules
//! - `bold`, `italic` and `underline` are OR-ed down the tree: once set by an
//!   ancestor they cannot be switched off by a descendant
//! - `color` and `size` take the element's own value when it declares one,
//!   otherwise the inherited value persists
//! - text outside any span gets `StyleAttributes::plain(base_size_pt)`
//!
//! ## Sizes
//! Sizes are kept in points. A size with no unit is read as points, not CSS
//! pixels, so `size=12` and `size=16px` are the same size. Hosts that report
//! unitless pixel values must append `px`.
//!
//! Resolution cannot fail, and it is never cached: callers resolve again on
//! every edit tick.

use crate::ast::*;

/// Resolve a paragraph into one styled character per character of its text.
pub fn resolve(paragraph: &Paragraph, base_size_pt: f64) -> CharacterStream {
    let mut out = Vec::new();
    let base = StyleAttributes::plain(base_size_pt);
    for node in &paragraph.content {
        walk(node, &base, &mut out);
    }
    out
}

fn walk(node: &StyledNode, inherited: &StyleAttributes, out: &mut CharacterStream) {
    match node {
        StyledNode::Text(text) => {
            out.extend(text.chars().map(|ch| StyledChar { ch, attrs: *inherited }));
        }
        StyledNode::Span { style, children } => {
            let attrs = merge(inherited, style);
            for child in children {
                walk(child, &attrs, out);
            }
        }
    }
}

/// Combine inherited attributes with an element's own declaration
pub fn merge(inherited: &StyleAttributes, own: &SpanStyle) -> StyleAttributes {
    StyleAttributes {
        bold: inherited.bold || own.bold,
        italic: inherited.italic || own.italic,
        underline: inherited.underline || own.underline,
        color: own.color.unwrap_or(inherited.color),
        size_pt: own.size_pt.unwrap_or(inherited.size_pt),
    }
}

/// Map a CSS color to its bucket.
///
/// Recognizes the names `blue`, `green` and `red`, the `rgb()` forms browsers
/// report for them, and their hex spellings. Anything else is black.
pub fn bucket_color(css: &str) -> ColorBucket {
    let c: String = css
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if c.contains("0,0,255") || c.contains("blue") || c == "#0000ff" || c == "#00f" {
        ColorBucket::Blue
    } else if c.contains("0,128,0") || c.contains("green") || c == "#008000" {
        ColorBucket::Green
    } else if c.contains("255,0,0") || c.contains("red") || c == "#ff0000" || c == "#f00" {
        ColorBucket::Red
    } else {
        ColorBucket::Black
    }
}

/// Parse a font size into points: `"14pt"`, `"20px"` or a bare `"14"`.
///
/// A bare number is points (see the module docs).
///
/// Returns `None` for anything unreadable or non-positive.
pub fn parse_size_pt(s: &str) -> Option<f64> {
    let s = s.trim();
    let (number, scale) = if let Some(px) = s.strip_suffix("px") {
        (px, 0.75)
    } else if let Some(pt) = s.strip_suffix("pt") {
        (pt, 1.0)
    } else {
        (s, 1.0)
    };
    let value: f64 = number.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value * scale)
    } else {
        None
    }
}

/// Convert a point size to CSS pixels
pub fn pt_to_px(size_pt: f64) -> f64 {
    size_pt * 96.0 / 72.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs_of(p: &Paragraph) -> Vec<StyleAttributes> {
        resolve(p, 12.0).into_iter().map(|c| c.attrs).collect()
    }

    #[test]
    fn test_unstyled_defaults() {
        let stream = resolve(&Paragraph::plain("ab"), 12.0);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream[0].ch, 'a');
        assert_eq!(stream[1].attrs, StyleAttributes::plain(12.0));
    }

    #[test]
    fn test_booleans_are_inherited() {
        let p = Paragraph::new(vec![StyledNode::span(
            SpanStyle::bold(),
            vec![
                StyledNode::text("a"),
                StyledNode::span(SpanStyle::italic(), vec![StyledNode::text("b")]),
            ],
        )]);
        let attrs = attrs_of(&p);
        assert!(attrs[0].bold && !attrs[0].italic);
        assert!(attrs[1].bold && attrs[1].italic);
    }

    #[test]
    fn test_own_color_and_size_override() {
        let p = Paragraph::new(vec![StyledNode::span(
            SpanStyle {
                color: Some(ColorBucket::Red),
                size_pt: Some(20.0),
                ..SpanStyle::default()
            },
            vec![
                StyledNode::text("a"),
                StyledNode::span(SpanStyle::color(ColorBucket::Blue), vec![StyledNode::text("b")]),
                StyledNode::span(SpanStyle::underline(), vec![StyledNode::text("c")]),
            ],
        )]);
        let attrs = attrs_of(&p);
        assert_eq!(attrs[0].color, ColorBucket::Red);
        assert_eq!(attrs[1].color, ColorBucket::Blue);
        assert_eq!(attrs[1].size_pt, 20.0);
        // Sibling span without a color keeps the inherited red
        assert_eq!(attrs[2].color, ColorBucket::Red);
        assert!(attrs[2].underline);
    }

    #[test]
    fn test_sibling_styles_do_not_leak() {
        let p = Paragraph::new(vec![
            StyledNode::span(SpanStyle::bold(), vec![StyledNode::text("a")]),
            StyledNode::text("b"),
        ]);
        let attrs = attrs_of(&p);
        assert!(attrs[0].bold);
        assert!(!attrs[1].bold);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let p = Paragraph::new(vec![StyledNode::span(
            SpanStyle::italic(),
            vec![StyledNode::text("ab c.")],
        )]);
        assert_eq!(resolve(&p, 12.0), resolve(&p, 12.0));
    }

    #[test]
    fn test_bucket_color() {
        assert_eq!(bucket_color("rgb(0, 0, 255)"), ColorBucket::Blue);
        assert_eq!(bucket_color("Green"), ColorBucket::Green);
        assert_eq!(bucket_color("#FF0000"), ColorBucket::Red);
        assert_eq!(bucket_color("rgb(12, 34, 56)"), ColorBucket::Black);
        assert_eq!(bucket_color(""), ColorBucket::Black);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size_pt("14pt"), Some(14.0));
        assert_eq!(parse_size_pt("16px"), Some(12.0));
        assert_eq!(parse_size_pt(" 18 "), Some(18.0));
        assert_eq!(parse_size_pt("big"), None);
        assert_eq!(parse_size_pt("0px"), None);
    }

    #[test]
    fn test_bare_size_is_points_not_pixels() {
        assert_eq!(parse_size_pt("12"), parse_size_pt("12pt"));
        assert_eq!(parse_size_pt("12"), parse_size_pt("16px"));
        assert_ne!(parse_size_pt("16"), parse_size_pt("16px"));
        assert_eq!(pt_to_px(12.0), 16.0);
    }
}
