//! Configuration for the fwcov coverage pipeline.
//!
//! Provides the optional `fwcov.toml` run configuration and the `.env`
//! environment overlay consumed once at startup and threaded explicitly to
//! every pipeline stage.
//!
//! # Usage
//!
//! ```rust
//! use fwcov_config::run_config::CoverageUserConfig;
//!
//! let user = CoverageUserConfig::from_toml("[simulator]\nqemu_timeout_secs = 60").unwrap();
//! assert_eq!(user.simulator.qemu_timeout_secs, 60);
//! // Everything else keeps its default.
//! assert_eq!(user.simulator.wokwi_timeout_secs, 140);
//! ```

pub mod env_file;
pub mod error;
pub mod prelude;
pub mod run_config;

pub use env_file::EnvOverlay;
pub use run_config::{CoverageConfig, CoverageUserConfig};
