//! Artifact persistence with own-source filtering.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::prelude::*;

/// Extension of the persisted counter files, matching what the compiler's
/// runtime would have produced.
pub const ARTIFACT_EXTENSION: &str = "gcda";

/// Writes reconstructed artifacts into the coverage directory.
///
/// The firmware dumps counters for everything it was built with, including
/// SDK and vendor sources. Only identifiers matching one of the own-source
/// markers are persisted; the rest is noise and is skipped silently.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    coverage_dir: PathBuf,
    own_sources: Vec<String>,
}

impl ArtifactWriter {
    /// Create a writer targeting `coverage_dir`.
    pub fn new(coverage_dir: impl Into<PathBuf>, own_sources: Vec<String>) -> Self {
        Self {
            coverage_dir: coverage_dir.into(),
            own_sources,
        }
    }

    /// Destination directory for persisted artifacts.
    pub fn coverage_dir(&self) -> &Path {
        &self.coverage_dir
    }

    /// Whether the identifier belongs to the project's own instrumented
    /// sources.
    pub fn is_own_source(&self, source: &str) -> bool {
        self.own_sources.iter().any(|marker| source.contains(marker))
    }

    /// Persist one artifact as `<coverage_dir>/<flat_name>.gcda`.
    ///
    /// Returns the written path, or `None` when the artifact was filtered
    /// out or its identifier flattens to nothing. Parent directories are
    /// created as needed; an existing file is overwritten.
    pub fn write(&self, artifact: &Artifact) -> Result<Option<PathBuf>> {
        if !self.is_own_source(&artifact.source) {
            debug!("skipping non-project source {}", artifact.source);
            return Ok(None);
        }
        let Some(name) = artifact.flat_name() else {
            warn!(
                "identifier {:?} flattens to nothing, not writing",
                artifact.source
            );
            return Ok(None);
        };

        let out_path = self
            .coverage_dir
            .join(format!("{name}.{ARTIFACT_EXTENSION}"));
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, &artifact.data)?;
        Ok(Some(out_path))
    }
}
