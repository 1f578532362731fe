//! # Document and Token Types
//!
//! This module defines the data model shared by every pass of the engine.
//!
//! ## Type Hierarchy
//! ```text
//! Document
//!   └── Vec<Paragraph>            (index = scheduling key)
//!         └── Vec<StyledNode>
//!               ├── Text(String)
//!               └── Span { style: SpanStyle, children: Vec<StyledNode> }
//!
//! CharacterStream = Vec<StyledChar { ch, attrs: StyleAttributes }>
//!
//! TokenSequence
//!   ├── Vec<Token>
//!   │     ├── kind: TokenKind (Letter | Chord | Rest)
//!   │     ├── accent / random: bool
//!   │     └── duration: f64
//!   └── total_duration: f64
//! ```
//!
//! ## Key Concepts
//!
//! ### Styles
//! A [`SpanStyle`] is what one element of the tree declares about itself; a
//! [`StyleAttributes`] is what a character ends up with after inheriting from
//! all of its ancestors (see `style::resolve`).
//!
//! ### Streams are ephemeral
//! A [`CharacterStream`] is derived from the tree on every edit tick and thrown
//! away afterwards. Positions in it are character offsets into the paragraph
//! text, which is what loop regions and carets refer to.
//!
//! ### Letter index
//! Every ASCII letter of a paragraph has an ordinal among the paragraph's
//! letters (muted letters included). Tokens carry it so a host can highlight
//! the letter that is currently sounding.

use serde::Serialize;

/// Coarse color category used to pick a waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBucket {
    #[default]
    Black,
    Blue,
    Green,
    Red,
}

/// Effective formatting of a single character
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: ColorBucket,
    pub size_pt: f64,
}

impl StyleAttributes {
    /// Unstyled text at the given font size
    pub fn plain(size_pt: f64) -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            color: ColorBucket::Black,
            size_pt,
        }
    }
}

/// Attributes declared by one element of the styled-text tree.
///
/// `None` for color or size means "inherit".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<ColorBucket>,
    pub size_pt: Option<f64>,
}

impl SpanStyle {
    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    pub fn italic() -> Self {
        Self { italic: true, ..Self::default() }
    }

    pub fn underline() -> Self {
        Self { underline: true, ..Self::default() }
    }

    pub fn color(color: ColorBucket) -> Self {
        Self { color: Some(color), ..Self::default() }
    }

    pub fn size(size_pt: f64) -> Self {
        Self { size_pt: Some(size_pt), ..Self::default() }
    }
}

/// A node of a paragraph's styled-text tree
#[derive(Debug, Clone, PartialEq)]
pub enum StyledNode {
    Text(String),
    Span {
        style: SpanStyle,
        children: Vec<StyledNode>,
    },
}

impl StyledNode {
    pub fn text(s: impl Into<String>) -> Self {
        StyledNode::Text(s.into())
    }

    pub fn span(style: SpanStyle, children: Vec<StyledNode>) -> Self {
        StyledNode::Span { style, children }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            StyledNode::Text(s) => out.push_str(s),
            StyledNode::Span { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }
}

/// A block-level unit of the document: the unit of activation and loop scheduling
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub content: Vec<StyledNode>,
}

impl Paragraph {
    pub fn new(content: Vec<StyledNode>) -> Self {
        Self { content }
    }

    /// A paragraph of unstyled text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            content: vec![StyledNode::Text(text.into())],
        }
    }

    /// The raw text content (all text runs concatenated)
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.content {
            node.push_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// One unstyled paragraph per line
    pub fn from_plain_text(text: &str) -> Self {
        Self {
            paragraphs: text.lines().map(Paragraph::plain).collect(),
        }
    }
}

/// Caret position: a paragraph index and a character offset into its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub paragraph: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyledChar {
    pub ch: char,
    pub attrs: StyleAttributes,
}

pub type CharacterStream = Vec<StyledChar>;

/// A single playable letter taken from the stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub ch: char,
    pub attrs: StyleAttributes,
    pub letter_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Letter(Letter),
    /// Letters sounded together; `attrs` (taken from the first letter) shape the sound
    Chord {
        letters: Vec<Letter>,
        attrs: StyleAttributes,
    },
    Rest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub accent: bool,
    pub random: bool,
    pub duration: f64,
}

impl Token {
    /// Letters that sound for this token, in order (empty for a rest)
    pub fn letters(&self) -> &[Letter] {
        match &self.kind {
            TokenKind::Letter(letter) => std::slice::from_ref(letter),
            TokenKind::Chord { letters, .. } => letters,
            TokenKind::Rest => &[],
        }
    }

    /// Style that shapes the sound of this token
    pub fn attrs(&self) -> Option<&StyleAttributes> {
        match &self.kind {
            TokenKind::Letter(letter) => Some(&letter.attrs),
            TokenKind::Chord { attrs, .. } => Some(attrs),
            TokenKind::Rest => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.kind, TokenKind::Rest)
    }
}

/// Output of the tokenizer: tokens in playing order plus their summed duration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenSequence {
    pub tokens: Vec<Token>,
    pub total_duration: f64,
}

impl TokenSequence {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Letters of every token, flattened; handy for compact assertions
    pub fn letter_groups(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| t.letters().iter().map(|l| l.ch).collect())
            .collect()
    }
}
