//! This module contains errors encountered when identifying opcodes by byte or
//! by name.

use thiserror::Error;

/// Errors when looking up an [`crate::opcode::Opcode`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("{_0:#04x} is not a supported arithmetic opcode")]
    InvalidOpcode(u8),

    #[error("`{_0}` is not a known opcode mnemonic")]
    UnknownMnemonic(String),
}
