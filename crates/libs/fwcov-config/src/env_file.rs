//! Environment overlay loading.
//!
//! Reads the optional `.env` file at the project root without touching the
//! process environment. Keys already set in the environment win over file
//! values; the remaining entries form an overlay that the pipeline passes
//! explicitly to every process it spawns.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::prelude::*;

/// Name of the optional environment override file.
pub const ENV_FILE: &str = ".env";

/// Extra environment variables for spawned pipeline processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    /// Load the overlay from `<root_dir>/.env`.
    ///
    /// A missing file is not an error and yields an empty overlay. Keys
    /// already present in the process environment keep their current value
    /// and are dropped from the overlay.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let env_path = root_dir.join(ENV_FILE);
        if !env_path.exists() {
            return Ok(Self::default());
        }
        info!("Loading environment from {:?}", env_path);
        Self::from_file(&env_path)
    }

    /// Parse an env file, keeping only keys the environment does not set.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut vars = BTreeMap::new();
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            if std::env::var_os(&key).is_none() {
                let _ = vars.insert(key, value);
            }
        }
        Ok(Self { vars })
    }

    /// Look up an overlay entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Overlay entries as owned pairs, ready for a process builder.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of overlay entries.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the overlay carries no entries.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_file_yields_empty_overlay() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let overlay = EnvOverlay::load(dir.path())?;
        assert!(overlay.is_empty());
        Ok(())
    }

    #[test]
    fn file_values_do_not_shadow_process_environment() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // PATH is always present when the test harness runs.
        fs::write(
            dir.path().join(ENV_FILE),
            "PATH=/nonexistent\nFWCOV_TEST_ONLY_KEY=abc\n",
        )?;
        let overlay = EnvOverlay::load(dir.path())?;
        assert_eq!(overlay.get("PATH"), None);
        assert_eq!(overlay.get("FWCOV_TEST_ONLY_KEY"), Some("abc"));
        assert_eq!(overlay.len(), 1);
        Ok(())
    }

    #[test]
    fn quotes_and_comments_are_handled() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(ENV_FILE),
            "# idf tools location\nFWCOV_TEST_QUOTED=\"hello world\"\n\nFWCOV_TEST_SINGLE='one'\n",
        )?;
        let overlay = EnvOverlay::load(dir.path())?;
        assert_eq!(overlay.get("FWCOV_TEST_QUOTED"), Some("hello world"));
        assert_eq!(overlay.get("FWCOV_TEST_SINGLE"), Some("one"));
        Ok(())
    }

    #[test]
    fn pairs_are_ready_for_process_spawning() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(ENV_FILE), "FWCOV_TEST_PAIR=1\n")?;
        let overlay = EnvOverlay::load(dir.path())?;
        assert_eq!(
            overlay.to_pairs(),
            vec![(String::from("FWCOV_TEST_PAIR"), String::from("1"))]
        );
        Ok(())
    }
}
