//! Build stage: compile the instrumented firmware.

use fwcov_config::{CoverageConfig, EnvOverlay};
use fwcov_io::runner::{Runner, RunVerdict};
use tracing::info;

use crate::common::run_stage;
use crate::prelude::*;

/// Extra sdkconfig layered on top of the defaults to enable gcov
/// instrumentation in the firmware.
const SDKCONFIG_ARG: &str = "SDKCONFIG_DEFAULTS=sdkconfig.defaults;sdkconfig.coverage";

/// Build the test project with coverage instrumentation enabled.
///
/// A non-zero exit aborts the pipeline with the build's own exit code.
pub async fn build(config: &CoverageConfig, env: &EnvOverlay) -> Result<()> {
    info!("Building project...");
    let runner = Runner::new("idf.py", vec!["-D", SDKCONFIG_ARG, "build"])
        .current_dir(&config.test_dir)
        .envs(env.to_pairs());

    let (verdict, _) = run_stage(runner, None, true).await?;
    match verdict {
        RunVerdict::Completed(status) if status.success() => Ok(()),
        RunVerdict::Completed(status) => Err(Error::Build(status)),
        RunVerdict::TimedOut => Err(Error::ProcessFailed(String::from("idf.py build"))),
    }
}
