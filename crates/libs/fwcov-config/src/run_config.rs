//! Run configuration for the coverage pipeline.
//!
//! All settings have defaults matching the reference ESP32 test project, so
//! the tool runs without any configuration file. An optional `fwcov.toml`
//! at the repository root overrides individual fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::prelude::*;

/// Name of the optional run configuration file.
pub const CONFIG_FILE: &str = "fwcov.toml";

/// Simulator budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Wall-clock budget for one QEMU run, in seconds.
    pub qemu_timeout_secs: u64,
    /// Wall-clock budget for one Wokwi run, in seconds.
    pub wokwi_timeout_secs: u64,
    /// Timeout handed to the Wokwi guest itself, in milliseconds.
    pub wokwi_guest_timeout_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            qemu_timeout_secs: 180,
            wokwi_timeout_secs: 140,
            wokwi_guest_timeout_ms: 120_000,
        }
    }
}

/// Artifact inclusion filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Substrings identifying the project's own instrumented sources.
    /// Dumped files matching none of these are skipped.
    pub own_sources: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            own_sources: vec![String::from("test_"), String::from("test_common")],
        }
    }
}

/// Artifact relocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocateConfig {
    /// Simple source names whose artifacts are placed next to their
    /// build-tree `.gcno` counterparts.
    pub sources: Vec<String>,
    /// Copy an artifact beside every matching `.gcno` instead of stopping
    /// at the first match. Useful when parallel build configurations carry
    /// same-named metadata files.
    pub all_matches: bool,
}

impl Default for RelocateConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                String::from("test_entry_gate_hw.cpp"),
                String::from("test_exit_gate_hw.cpp"),
                String::from("test_common.cpp"),
            ],
            all_matches: false,
        }
    }
}

/// Coverage report settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// `gcov` executable handed to the reporter; the cross toolchain's by
    /// default.
    pub gcov_executable: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gcov_executable: String::from("xtensa-esp32-elf-gcov"),
        }
    }
}

/// User-provided settings from an optional `fwcov.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageUserConfig {
    /// Test project directory, relative to the repository root.
    pub project_dir: PathBuf,
    /// Simulator budgets.
    pub simulator: SimulatorConfig,
    /// Artifact inclusion filter.
    pub filter: FilterConfig,
    /// Artifact relocation settings.
    pub relocate: RelocateConfig,
    /// Coverage report settings.
    pub report: ReportConfig,
}

impl Default for CoverageUserConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("test/unity-hw-tests"),
            simulator: SimulatorConfig::default(),
            filter: FilterConfig::default(),
            relocate: RelocateConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl CoverageUserConfig {
    /// Load `<root_dir>/fwcov.toml`, falling back to defaults when absent.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let path = root_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        info!("Loading configuration from {:?}", path);
        Self::from_file(&path)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }
}

/// Resolved configuration with the absolute paths used by every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageConfig {
    /// Repository root the tool was invoked from.
    pub root_dir: PathBuf,
    /// Test project directory.
    pub test_dir: PathBuf,
    /// Build output tree, holds the compiler-emitted `.gcno` files.
    pub build_dir: PathBuf,
    /// Destination for reconstructed `.gcda` artifacts.
    pub coverage_dir: PathBuf,
    /// Destination for the generated report.
    pub report_dir: PathBuf,
    /// Simulator budgets.
    pub simulator: SimulatorConfig,
    /// Artifact inclusion filter.
    pub filter: FilterConfig,
    /// Artifact relocation settings.
    pub relocate: RelocateConfig,
    /// Coverage report settings.
    pub report: ReportConfig,
}

impl CoverageConfig {
    /// Resolve a user configuration against the repository root.
    pub fn resolve(root_dir: impl Into<PathBuf>, user: CoverageUserConfig) -> Self {
        let root_dir = root_dir.into();
        let test_dir = root_dir.join(&user.project_dir);
        Self {
            build_dir: test_dir.join("build"),
            coverage_dir: test_dir.join("coverage"),
            report_dir: test_dir.join("coverage_report"),
            simulator: user.simulator,
            filter: user.filter,
            relocate: user.relocate,
            report: user.report,
            test_dir,
            root_dir,
        }
    }
}
