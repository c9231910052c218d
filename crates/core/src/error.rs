//! Data-error types.
//!
//! Contract violations (wrong accessor, missing required handler, backend
//! misuse) panic; only malformed *input data* is reported through `Result`.

use thiserror::Error;

/// Text parsing failure with the byte offset of the first offending token.
///
/// The display form is stable and intended for direct presentation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parsing failed at offset {offset}")]
pub struct ParseError {
    /// Byte offset into the input where parsing stopped.
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn at(offset: usize) -> Self {
        ParseError { offset }
    }
}
