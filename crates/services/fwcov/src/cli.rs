//! Command-line interface for the coverage pipeline.

use clap::Parser;

/// Command-line interface for the coverage pipeline.
#[derive(Parser, Debug)]
#[command(name = "fwcov")]
#[command(about = "Run instrumented firmware in a simulator and extract a coverage report")]
pub struct Cli {
    /// Use the Wokwi cloud simulator instead of the local QEMU emulator
    #[arg(long)]
    pub wokwi: bool,

    /// Skip the build stage and reuse the previous build outputs
    #[arg(long)]
    pub skip_build: bool,
}
