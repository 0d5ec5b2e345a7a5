//! This module contains the primary error type for the library's interface. It
//! also re-exports the more specific error types that are subsystem-specific.

pub mod container;
pub mod execution;
pub mod fixture;
pub mod parse;

use thiserror::Error;

/// The interface result type for the library.
///
/// Subsystems return their more-specific child error types, which convert
/// into this one with `?`.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Errors from executing opcodes.
    #[error(transparent)]
    Execution(#[from] execution::LocatedError),

    /// Errors from looking up opcodes.
    #[error(transparent)]
    Parse(#[from] parse::Error),

    /// Errors from loading conformance fixtures.
    #[error(transparent)]
    Fixture(#[from] fixture::Error),
}
