//! Common types and utilities.

/// Coverage pipeline error type.
pub use crate::error::Error;

/// Coverage pipeline result type.
pub type Result<T> = core::result::Result<T, Error>;
