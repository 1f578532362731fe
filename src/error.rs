//! # Error Types
//!
//! The notation core itself never fails: any text is valid notation, possibly
//! silent. Errors only exist at the edges of the crate, where text from outside
//! is turned into documents or configuration.
//!
//! ## Error Types
//! - `MarkupError` - malformed styled markup, with line and column information
//! - `ConfigError` - invalid YAML or out-of-range configuration values
//! - `Io` - file access from the command line tool
//! - `Output` - YAML output of the command line tool
//!
//! ## Usage
//! ```rust
//! use tonetype::{markup, ToneTypeError};
//!
//! match markup::parse_document("<b>ab</i>.") {
//!     Ok(doc) => println!("{} paragraphs", doc.paragraphs.len()),
//!     Err(ToneTypeError::MarkupError { line, column, message }) => {
//!         eprintln!("Markup error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToneTypeError {
    /// Markup error with location information.
    ///
    /// Occurs when the styled markup has an unknown tag, a closing tag that
    /// does not match the open one, or an attribute that cannot be read.
    ///
    /// # Example
    /// ```
    /// # use tonetype::ToneTypeError;
    /// let err = ToneTypeError::MarkupError {
    ///     line: 2,
    ///     column: 4,
    ///     message: "Unknown tag <x>".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Markup error at line 2, column 4: Unknown tag <x>");
    /// ```
    #[error("Markup error at line {line}, column {column}: {message}")]
    MarkupError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use tonetype::ToneTypeError;
    /// let err = ToneTypeError::ConfigError("base-duration must be positive".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: base-duration must be positive");
    /// ```
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Note events could not be written out as YAML
    #[error("Output error: {0}")]
    Output(#[from] serde_yaml::Error),
}
