//! Coverage pipeline error types.

use std::process::ExitStatus;

/// Coverage pipeline errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] fwcov_config::error::Error),

    /// Coverage dump extraction failed.
    #[error(transparent)]
    Dump(#[from] fwcov_dump::error::Error),

    /// Firmware build failed.
    #[error("firmware build failed with {0}")]
    Build(ExitStatus),

    /// Flash image merge failed.
    #[error("flash image merge failed with {0}")]
    ImageMerge(ExitStatus),

    /// Coverage report generation failed.
    #[error("coverage report generation failed with {0}")]
    Report(ExitStatus),

    /// A pipeline process could not be spawned or monitored.
    #[error("failed to run `{0}`")]
    ProcessFailed(String),
}

impl Error {
    /// Exit code for the whole pipeline, propagating the failing stage's
    /// own code where it has one.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Build(status) | Self::ImageMerge(status) | Self::Report(status) => status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .unwrap_or(1),
            _ => 1,
        }
    }
}
