//! # Styled Markup Reader
//!
//! Reads a small inline markup into the styled-text trees the engine consumes.
//! The editing surface normally hands the engine its trees directly; this
//! reader is how tests, the command line tool, and hosts without a rich text
//! widget describe formatting.
//!
//! ## Syntax
//! | Markup | Effect |
//! |---|---|
//! | `<b>…</b>`, `<strong>…</strong>` | bold |
//! | `<i>…</i>`, `<em>…</em>` | italic |
//! | `<u>…</u>` | underline |
//! | `<span color=red size=20px>…</span>` | color and/or size |
//! | `&lt;` `&gt;` `&amp;` | literal `<` `>` `&` |
//!
//! Every line is one paragraph. Tags cannot span lines; every tag opened on a
//! line must be closed on it.

use crate::ast::*;
use crate::error::ToneTypeError;
use crate::style::{bucket_color, parse_size_pt};

/// Read a whole document, one paragraph per line.
pub fn parse_document(source: &str) -> Result<Document, ToneTypeError> {
    let paragraphs = source
        .lines()
        .enumerate()
        .map(|(i, line)| MarkupReader::new(line, i + 1).read())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Document { paragraphs })
}

/// Read a single paragraph of markup.
pub fn parse_paragraph(source: &str) -> Result<Paragraph, ToneTypeError> {
    MarkupReader::new(source, 1).read()
}

/// An element opened but not yet closed
struct OpenTag {
    name: String,
    style: SpanStyle,
    children: Vec<StyledNode>,
    column: usize,
}

struct MarkupReader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> MarkupReader<'a> {
    fn new(input: &'a str, line: usize) -> Self {
        Self {
            chars: input.chars().peekable(),
            line,
            column: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.column += 1;
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn error(&self, column: usize, message: String) -> ToneTypeError {
        ToneTypeError::MarkupError {
            line: self.line,
            column,
            message,
        }
    }

    fn read(mut self) -> Result<Paragraph, ToneTypeError> {
        let mut root: Vec<StyledNode> = Vec::new();
        let mut stack: Vec<OpenTag> = Vec::new();
        let mut text = String::new();

        while let Some(&c) = self.peek() {
            let column = self.column;
            match c {
                '<' => {
                    self.advance();
                    let closing = if let Some(&'/') = self.peek() {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    let body = self.read_until('>', column)?;

                    flush_text(&mut text, current_children(&mut root, &mut stack));

                    if closing {
                        let name = body.trim().to_lowercase();
                        let open = stack.pop().ok_or_else(|| {
                            self.error(column, format!("Closing tag </{}> has no opening tag", name))
                        })?;
                        if open.name != name {
                            return Err(self.error(
                                column,
                                format!(
                                    "Closing tag </{}> does not match <{}> opened at column {}",
                                    name, open.name, open.column
                                ),
                            ));
                        }
                        current_children(&mut root, &mut stack)
                            .push(StyledNode::span(open.style, open.children));
                    } else {
                        let (name, style) = self.parse_tag(&body, column)?;
                        stack.push(OpenTag {
                            name,
                            style,
                            children: Vec::new(),
                            column,
                        });
                    }
                }
                '&' => {
                    self.advance();
                    let entity = self.read_until(';', column)?;
                    let ch = match entity.as_str() {
                        "lt" => '<',
                        "gt" => '>',
                        "amp" => '&',
                        "quot" => '"',
                        _ => {
                            return Err(self.error(column, format!("Unknown entity &{};", entity)));
                        }
                    };
                    text.push(ch);
                }
                _ => {
                    self.advance();
                    text.push(c);
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(self.error(open.column, format!("Tag <{}> is never closed", open.name)));
        }
        flush_text(&mut text, &mut root);
        Ok(Paragraph::new(root))
    }

    /// Consume up to and including `end`, returning what came before it
    fn read_until(&mut self, end: char, start_column: usize) -> Result<String, ToneTypeError> {
        let mut body = String::new();
        loop {
            match self.advance() {
                Some(c) if c == end => return Ok(body),
                Some(c) => body.push(c),
                None => {
                    return Err(self.error(start_column, format!("Expected '{}' before end of line", end)));
                }
            }
        }
    }

    fn parse_tag(&self, body: &str, column: usize) -> Result<(String, SpanStyle), ToneTypeError> {
        let parts = split_tag_body(body)
            .ok_or_else(|| self.error(column, "Unterminated quoted attribute value".to_string()))?;
        let mut parts = parts.into_iter();
        let name = parts
            .next()
            .ok_or_else(|| self.error(column, "Empty tag <>".to_string()))?
            .to_lowercase();

        let mut style = match name.as_str() {
            "b" | "strong" => SpanStyle::bold(),
            "i" | "em" => SpanStyle::italic(),
            "u" => SpanStyle::underline(),
            "span" => SpanStyle::default(),
            _ => return Err(self.error(column, format!("Unknown tag <{}>", name))),
        };

        for attribute in parts {
            let (key, value) = attribute.split_once('=').ok_or_else(|| {
                self.error(column, format!("Attribute '{}' must look like key=value", attribute))
            })?;
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            match key.to_lowercase().as_str() {
                "color" => style.color = Some(bucket_color(value)),
                "size" => {
                    let size = parse_size_pt(value).ok_or_else(|| {
                        self.error(column, format!("Invalid size '{}'", value))
                    })?;
                    style.size_pt = Some(size);
                }
                other => {
                    return Err(self.error(column, format!("Unknown attribute '{}' on <{}>", other, name)));
                }
            }
        }

        Ok((name, style))
    }
}

/// Split a tag body on whitespace outside quotes, so a quoted value such as
/// `color="rgb(0, 0, 255)"` stays one part. `None` if a quote is left open.
fn split_tag_body(body: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                current.push(c);
                quote = Some(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Some(parts)
}

fn current_children<'s>(
    root: &'s mut Vec<StyledNode>,
    stack: &'s mut [OpenTag],
) -> &'s mut Vec<StyledNode> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => root,
    }
}

fn flush_text(text: &mut String, into: &mut Vec<StyledNode>) {
    if !text.is_empty() {
        into.push(StyledNode::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::resolve;

    #[test]
    fn test_plain_text() {
        let p = parse_paragraph("ab c.").unwrap();
        assert_eq!(p, Paragraph::plain("ab c."));
    }

    #[test]
    fn test_nested_tags() {
        let p = parse_paragraph("a<b>b<i>c</i></b>.").unwrap();
        assert_eq!(p.text(), "abc.");
        let stream = resolve(&p, 12.0);
        assert!(!stream[0].attrs.bold);
        assert!(stream[1].attrs.bold && !stream[1].attrs.italic);
        assert!(stream[2].attrs.bold && stream[2].attrs.italic);
    }

    #[test]
    fn test_span_attributes() {
        let p = parse_paragraph("<span color=\"rgb(0,0,255)\" size=24px>x</span>").unwrap();
        let stream = resolve(&p, 12.0);
        assert_eq!(stream[0].attrs.color, ColorBucket::Blue);
        assert_eq!(stream[0].attrs.size_pt, 18.0);
    }

    #[test]
    fn test_quoted_attribute_with_spaces() {
        let p = parse_paragraph("<span color=\"rgb(0, 0, 255)\" size='20 px'>x</span>").unwrap();
        let stream = resolve(&p, 12.0);
        assert_eq!(stream[0].attrs.color, ColorBucket::Blue);
        assert_eq!(stream[0].attrs.size_pt, 15.0);

        let p = parse_paragraph("<span  color = red>y</span>");
        assert!(p.is_err(), "unquoted spaces around '=' are not attributes");
    }

    #[test]
    fn test_unterminated_attribute_quote() {
        let err = parse_paragraph("<span color=\"red>x</span>").unwrap_err();
        assert!(matches!(err, ToneTypeError::MarkupError { .. }));
    }

    #[test]
    fn test_entities() {
        let p = parse_paragraph("a &lt;b&gt; &amp;").unwrap();
        assert_eq!(p.text(), "a <b> &");
    }

    #[test]
    fn test_document_lines() {
        let doc = parse_document("ab.\n<u>c</u>\n").unwrap();
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[1].text(), "c");
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse_paragraph("<b>ab</i>").unwrap_err();
        match err {
            ToneTypeError::MarkupError { line, column, message } => {
                assert_eq!(line, 1);
                assert_eq!(column, 6);
                assert!(message.contains("does not match"));
            }
            _ => panic!("Expected MarkupError"),
        }
    }

    #[test]
    fn test_unclosed_tag_reports_its_line() {
        let err = parse_document("ok.\n<b>ab").unwrap_err();
        match err {
            ToneTypeError::MarkupError { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("never closed"));
            }
            _ => panic!("Expected MarkupError"),
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(parse_paragraph("<blink>a</blink>").is_err());
    }

    #[test]
    fn test_bad_size() {
        assert!(parse_paragraph("<span size=huge>a</span>").is_err());
    }
}
