//! Pipeline orchestration.
//!
//! Stages run strictly in order, each exactly once:
//! load env → build (optional) → simulate → parse → persist → relocate →
//! report. Every stage failure aborts the remainder; there is no retry
//! logic anywhere.

use std::path::PathBuf;

use fwcov_config::{CoverageConfig, CoverageUserConfig, EnvOverlay};
use fwcov_dump::{ArtifactWriter, DumpParser, DumpScan};
use tracing::{error, info, warn};

use crate::build::build;
use crate::cli::Cli;
use crate::prelude::*;
use crate::relocate::relocate_artifacts;
use crate::report::generate_report;
use crate::simulator::{SimulatorBackend, select_backend, simulate};

/// How much captured output to show the operator when no dump region was
/// found.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// One coverage run: configuration, environment overlay, and the selected
/// simulator backend.
pub struct Pipeline {
    config: CoverageConfig,
    env: EnvOverlay,
    backend: Box<dyn SimulatorBackend>,
    skip_build: bool,
}

impl Pipeline {
    /// Assemble a pipeline from the repository root and CLI flags.
    pub fn new(root_dir: PathBuf, cli: &Cli) -> Result<Self> {
        let env = EnvOverlay::load(&root_dir)?;
        let user = CoverageUserConfig::load(&root_dir)?;
        let backend = select_backend(&user.simulator, cli.wokwi);
        let config = CoverageConfig::resolve(root_dir, user);
        Ok(Self {
            config,
            env,
            backend,
            skip_build: cli.skip_build,
        })
    }

    /// Run all stages in order.
    pub async fn run(&self) -> Result<()> {
        if self.skip_build {
            info!("Skipping build...");
        } else {
            build(&self.config, &self.env).await?;
        }

        let output = simulate(self.backend.as_ref(), &self.config, &self.env).await?;

        info!("Parsing output for coverage data...");
        let tail: Vec<String> = output
            .tail(DIAGNOSTIC_TAIL_LINES)
            .iter()
            .map(|line| line.to_string())
            .collect();
        let scan = match DumpParser::parse(output) {
            Ok(scan) => scan,
            Err(err) => {
                error!("Failed to extract coverage data: {}", err);
                println!("Output tail:");
                for line in &tail {
                    println!("{}", line);
                }
                return Err(err.into());
            }
        };
        self.persist(&scan)?;

        info!("Organizing coverage files...");
        let placed = relocate_artifacts(
            &self.config.coverage_dir,
            &self.config.build_dir,
            &self.config.relocate,
        )?;
        info!("{} artifact copies placed in the build tree", placed);

        generate_report(&self.config, &self.env).await
    }

    /// Persist the scanned artifacts through the own-source filter.
    fn persist(&self, scan: &DumpScan) -> Result<()> {
        if !scan.corrupt.is_empty() {
            warn!(
                "{} corrupt payload(s) skipped: {}",
                scan.corrupt.len(),
                scan.corrupt.join(", ")
            );
        }
        let writer = ArtifactWriter::new(
            &self.config.coverage_dir,
            self.config.filter.own_sources.clone(),
        );
        let mut written = 0;
        for artifact in &scan.artifacts {
            if let Some(path) = writer.write(artifact)? {
                info!("Saving {:?}...", path);
                written += 1;
            }
        }
        info!(
            "{} of {} artifact(s) persisted to {:?}",
            written,
            scan.artifacts.len(),
            self.config.coverage_dir
        );
        Ok(())
    }
}
