//! Simulator backends: local QEMU emulator and Wokwi cloud simulator.
//!
//! Both run the same flashed firmware and differ only in how a bootable
//! image is prepared, which process is launched, and how long it may run.
//! The target never exits on its own, so a timeout is the normal way a
//! simulation ends and the output captured up to that point is what gets
//! parsed.

use std::time::Duration;

use async_trait::async_trait;
use fwcov_config::run_config::SimulatorConfig;
use fwcov_config::{CoverageConfig, EnvOverlay};
use fwcov_dump::CapturedOutput;
use fwcov_io::runner::{Runner, RunVerdict};
use tracing::info;

use crate::common::run_stage;
use crate::prelude::*;

/// Flash image the merge step produces inside the build directory.
const MERGED_IMAGE: &str = "merged-qemu.bin";

/// One simulator variant: how to prepare it, how to launch it, and how
/// long to let it run.
#[async_trait]
pub trait SimulatorBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Wall-clock budget for one simulator run.
    fn timeout_budget(&self) -> Duration;

    /// One-time setup before launch. A failure here aborts the pipeline.
    async fn prepare(&self, config: &CoverageConfig, env: &EnvOverlay) -> Result<()>;

    /// The simulator process itself.
    fn launch(&self, config: &CoverageConfig, env: &EnvOverlay) -> Runner;
}

/// Local full-system emulator, fed a merged flash image.
pub struct QemuBackend {
    budget: Duration,
}

/// Cloud-hosted device simulator, run against the project directory.
pub struct WokwiBackend {
    budget: Duration,
    guest_timeout_ms: u64,
}

/// Select the backend once, from configuration.
pub fn select_backend(simulator: &SimulatorConfig, use_wokwi: bool) -> Box<dyn SimulatorBackend> {
    if use_wokwi {
        Box::new(WokwiBackend {
            budget: Duration::from_secs(simulator.wokwi_timeout_secs),
            guest_timeout_ms: simulator.wokwi_guest_timeout_ms,
        })
    } else {
        Box::new(QemuBackend {
            budget: Duration::from_secs(simulator.qemu_timeout_secs),
        })
    }
}

#[async_trait]
impl SimulatorBackend for QemuBackend {
    fn name(&self) -> &'static str {
        "qemu"
    }

    fn timeout_budget(&self) -> Duration {
        self.budget
    }

    /// Merge the build outputs into a single bootable flash image. QEMU's
    /// esp32 machine wants the whole flash, partition table included.
    async fn prepare(&self, config: &CoverageConfig, env: &EnvOverlay) -> Result<()> {
        info!("Preparing QEMU execution...");
        let runner = Runner::new(
            "esptool.py",
            vec![
                "--chip",
                "esp32",
                "merge_bin",
                "-o",
                MERGED_IMAGE,
                "--fill-flash-size",
                "4MB",
                "@flash_args",
            ],
        )
        .current_dir(&config.build_dir)
        .envs(env.to_pairs());

        let (verdict, _) = run_stage(runner, None, true).await?;
        match verdict {
            RunVerdict::Completed(status) if status.success() => Ok(()),
            RunVerdict::Completed(status) => Err(Error::ImageMerge(status)),
            RunVerdict::TimedOut => Err(Error::ProcessFailed(String::from("esptool.py"))),
        }
    }

    fn launch(&self, config: &CoverageConfig, env: &EnvOverlay) -> Runner {
        let drive = format!("file={MERGED_IMAGE},if=mtd,format=raw");
        Runner::new(
            "qemu-system-xtensa",
            vec![
                "-nographic",
                "-machine",
                "esp32",
                "-drive",
                drive.as_str(),
                "-serial",
                "mon:stdio",
            ],
        )
        .current_dir(&config.build_dir)
        .envs(env.to_pairs())
    }
}

#[async_trait]
impl SimulatorBackend for WokwiBackend {
    fn name(&self) -> &'static str {
        "wokwi"
    }

    fn timeout_budget(&self) -> Duration {
        self.budget
    }

    async fn prepare(&self, _config: &CoverageConfig, _env: &EnvOverlay) -> Result<()> {
        Ok(())
    }

    fn launch(&self, config: &CoverageConfig, env: &EnvOverlay) -> Runner {
        let guest_timeout = self.guest_timeout_ms.to_string();
        Runner::new("wokwi-cli", vec!["--timeout", guest_timeout.as_str()])
            .current_dir(&config.test_dir)
            .envs(env.to_pairs())
    }
}

/// Run the selected simulator and capture its combined console output.
///
/// A timeout is expected and non-fatal; so is a simulator that exits on its
/// own with a non-zero status. Either way the captured output is returned
/// for parsing.
pub async fn simulate(
    backend: &dyn SimulatorBackend,
    config: &CoverageConfig,
    env: &EnvOverlay,
) -> Result<CapturedOutput> {
    backend.prepare(config, env).await?;

    info!("Starting {}...", backend.name());
    let runner = backend.launch(config, env);
    let (verdict, output) = run_stage(runner, Some(backend.timeout_budget()), false).await?;
    match verdict {
        RunVerdict::TimedOut => info!(
            "{} timed out (expected, the target does not auto-quit)",
            backend.name()
        ),
        RunVerdict::Completed(status) => info!("{} exited with {}", backend.name(), status),
    }
    Ok(output)
}
