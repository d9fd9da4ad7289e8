//! Dump extraction error types.

/// Dump extraction errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The captured output carries no coverage dump region at all.
    #[error("coverage dump start marker not found in captured output")]
    RegionMissing,

    /// A hex payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] hex::FromHexError),

    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
