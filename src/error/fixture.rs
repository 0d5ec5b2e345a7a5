//! This module contains errors encountered while loading conformance fixtures.

use thiserror::Error;

use crate::constant::WORD_SIZE_BYTES;

/// Errors from reading and decoding fixture files.
///
/// The underlying I/O and JSON errors are stored as strings so that this type
/// can remain [`Clone`] like the rest of the library's errors.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Could not read fixture file {path:?}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid fixture JSON: {_0}")]
    Json(String),

    #[error("Invalid hex string {value:?}: {message}")]
    InvalidHex { value: String, message: String },

    #[error("Operand of {bytes:?} bytes is wider than the {max} byte word", max = WORD_SIZE_BYTES)]
    TooWide { bytes: usize },

    #[error("Fixtures hold two operands but {opcode} takes {arg_count:?}")]
    UnsupportedArity { opcode: String, arg_count: usize },
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value.to_string())
    }
}
