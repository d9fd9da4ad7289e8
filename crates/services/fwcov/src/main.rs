//! fwcov - coverage pipeline for simulated firmware
//!
//! Firmware that only runs inside a simulator cannot write coverage files
//! to the host, so it serializes its gcov counters into the console. This
//! tool drives the whole round trip:
//!
//! 1. **Build**: compile the test firmware with coverage instrumentation
//! 2. **Simulate**: boot it under QEMU (or Wokwi) and capture the console
//! 3. **Extract**: reconstruct `.gcda` artifacts from the console dump
//! 4. **Relocate**: place artifacts beside their `.gcno` counterparts
//! 5. **Report**: hand everything to gcovr
//!
//! The simulator has no clean exit signal, so simulation ends by wall-clock
//! timeout and whatever output accumulated is used.

mod build;
mod cli;
mod common;
mod error;
mod pipeline;
mod prelude;
mod relocate;
mod report;
mod simulator;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::pipeline::Pipeline;

/// Main entry point for the coverage pipeline.
///
/// Initializes logging, parses command line arguments, assembles the
/// pipeline, and propagates the failing stage's exit code.
///
/// # Examples
///
/// ```bash
/// # Build, run under QEMU, extract, report
/// fwcov
///
/// # Reuse the previous build and run on Wokwi instead
/// fwcov --wokwi --skip-build
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fwcov=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let root_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            error!("Failed to resolve the working directory: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = match Pipeline::new(root_dir, &cli) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
