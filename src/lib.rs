//! Text-as-music engine: styled prose is read as a score.
//!
//! | Symbol | Meaning |
//! |---|---|
//! | `.` at paragraph end | activate the paragraph |
//! | `[ … ]` | loop region |
//! | `( … )` | live region; `(` at paragraph start makes a live paragraph |
//! | `!` | accent |
//! | `?` | random pitch |
//! | `" … "` | muted span |
//! | `/` | rest; the silence key in live mode |
//!
//! Bold, italic, underline, color and size of each letter shape its sound.

pub mod api;
pub mod ast;
pub mod config;
pub mod error;
pub mod loops;
pub mod markup;
pub mod notation;
pub mod playback;
pub mod style;

pub use api::{compile_paragraph, tokenize_text, CompiledParagraph, Session};
pub use ast::*;
pub use config::EngineConfig;
pub use error::*;
pub use markup::{parse_document, parse_paragraph};
pub use notation::tokenize;
pub use style::resolve;
