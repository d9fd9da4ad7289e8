//! Report stage: invoke the external coverage reporter.

use std::fs;

use fwcov_config::{CoverageConfig, EnvOverlay};
use fwcov_io::runner::{Runner, RunVerdict};
use tracing::info;

use crate::common::run_stage;
use crate::prelude::*;

/// Report location inside the test project, as handed to the reporter.
const REPORT_OUTPUT: &str = "coverage_report/index.html";

/// Generate the HTML coverage report with gcovr.
///
/// The reporter pairs the relocated `.gcda` artifacts with their `.gcno`
/// counterparts on its own; its exit code becomes the pipeline's.
pub async fn generate_report(config: &CoverageConfig, env: &EnvOverlay) -> Result<()> {
    info!("Generating HTML report...");
    fs::create_dir_all(&config.report_dir)?;

    let runner = Runner::new(
        "gcovr",
        vec![
            "--gcov-executable",
            config.report.gcov_executable.as_str(),
            "--html",
            "--html-details",
            "-o",
            REPORT_OUTPUT,
            "-r",
            ".",
        ],
    )
    .current_dir(&config.test_dir)
    .envs(env.to_pairs());

    let (verdict, _) = run_stage(runner, None, true).await?;
    match verdict {
        RunVerdict::Completed(status) if status.success() => {
            println!("Done! Report: {:?}", config.report_dir.join("index.html"));
            Ok(())
        }
        RunVerdict::Completed(status) => Err(Error::Report(status)),
        RunVerdict::TimedOut => Err(Error::ProcessFailed(String::from("gcovr"))),
    }
}
