//! Common types and utilities.

/// Dump extraction error type.
pub use crate::error::Error;

/// Dump extraction result type.
pub type Result<T> = core::result::Result<T, Error>;
