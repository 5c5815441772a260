//! Parse error types.

use crate::sniff::DocFormat;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors from turning document text into a node tree.
///
/// These are the only failures the parsers surface as `Err`; everything
/// downstream (unresolved references, validation findings) goes through
/// the diagnostics store instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The text is not well-formed in the detected format. The message
    /// includes the position as reported by the underlying parser.
    #[error("{format} syntax error: {message}")]
    Syntax { format: DocFormat, message: String },

    /// The input contained no document at all.
    #[error("no document found in input")]
    Empty,
}
