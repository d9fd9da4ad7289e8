//! Relocation stage: place reconstructed artifacts next to their
//! compiler-emitted metadata files.
//!
//! The reporter pairs each `.gcda` with the `.gcno` the compiler wrote at
//! build time, and expects them side by side. The build tree's layout is
//! the build system's business, so the matching `.gcno` is found by
//! walking the tree rather than by reconstructing its path.

use std::fs;
use std::path::Path;

use fwcov_config::run_config::RelocateConfig;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::prelude::*;

/// Copy each recognized artifact beside a `.gcno` with a matching simple
/// name somewhere under the build tree. Returns the number of copies made.
///
/// An artifact matching no `.gcno` anywhere is left unplaced; the reporter
/// tolerates missing pairs for untouched files.
pub fn relocate_artifacts(
    coverage_dir: &Path,
    build_dir: &Path,
    config: &RelocateConfig,
) -> Result<usize> {
    if !coverage_dir.is_dir() {
        return Ok(0);
    }

    let mut placed = 0;
    for entry in fs::read_dir(coverage_dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.ends_with(".gcda") {
            continue;
        }
        let Some(simple_name) = config
            .sources
            .iter()
            .find(|source| file_name.contains(source.as_str()))
        else {
            debug!("no relocation pattern matches {}", file_name);
            continue;
        };
        placed += place(&entry.path(), build_dir, simple_name, config.all_matches)?;
    }
    Ok(placed)
}

fn place(artifact: &Path, build_dir: &Path, simple_name: &str, all_matches: bool) -> Result<usize> {
    let mut copies = 0;
    for candidate in WalkDir::new(build_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let name = candidate.file_name().to_string_lossy();
        if !(name.ends_with(".gcno") && name.contains(simple_name)) {
            continue;
        }
        let target = candidate.path().with_file_name(format!("{simple_name}.gcda"));
        info!("copy {:?} -> {:?}", artifact, target);
        let _ = fs::copy(artifact, &target)?;
        copies += 1;
        if !all_matches {
            break;
        }
    }
    if copies == 0 {
        warn!(
            "no .gcno matches {} under {:?}, artifact left unplaced",
            simple_name, build_dir
        );
    }
    Ok(copies)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn relocate_config(all_matches: bool) -> RelocateConfig {
        RelocateConfig {
            sources: vec![
                String::from("test_entry_gate_hw.cpp"),
                String::from("test_exit_gate_hw.cpp"),
                String::from("test_common.cpp"),
            ],
            all_matches,
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        coverage_dir: PathBuf,
        build_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let coverage_dir = dir.path().join("coverage");
        let build_dir = dir.path().join("build");
        fs::create_dir_all(&coverage_dir).expect("coverage dir");
        fs::create_dir_all(&build_dir).expect("build dir");
        Fixture {
            _dir: dir,
            coverage_dir,
            build_dir,
        }
    }

    #[test]
    fn artifact_lands_beside_its_metadata_file() -> Result<()> {
        let fx = fixture();
        fs::write(fx.coverage_dir.join("main_test_common.cpp.gcda"), b"data")?;
        let gcno_dir = fx.build_dir.join("esp-idf/main/CMakeFiles/obj.dir");
        fs::create_dir_all(&gcno_dir)?;
        fs::write(gcno_dir.join("test_common.cpp.gcno"), b"meta")?;

        let placed = relocate_artifacts(&fx.coverage_dir, &fx.build_dir, &relocate_config(false))?;
        assert_eq!(placed, 1);
        assert_eq!(fs::read(gcno_dir.join("test_common.cpp.gcda"))?, b"data");
        Ok(())
    }

    #[test]
    fn unmatched_artifact_is_left_unplaced_without_error() -> Result<()> {
        let fx = fixture();
        fs::write(fx.coverage_dir.join("main_test_common.cpp.gcda"), b"data")?;

        let placed = relocate_artifacts(&fx.coverage_dir, &fx.build_dir, &relocate_config(false))?;
        assert_eq!(placed, 0);
        Ok(())
    }

    #[test]
    fn unrecognized_artifacts_are_ignored() -> Result<()> {
        let fx = fixture();
        fs::write(fx.coverage_dir.join("vendor_lib.cpp.gcda"), b"data")?;
        fs::write(fx.coverage_dir.join("notes.txt"), b"text")?;

        let placed = relocate_artifacts(&fx.coverage_dir, &fx.build_dir, &relocate_config(false))?;
        assert_eq!(placed, 0);
        Ok(())
    }

    #[test]
    fn first_match_wins_by_default() -> Result<()> {
        let fx = fixture();
        fs::write(fx.coverage_dir.join("test_common.cpp.gcda"), b"data")?;
        let dir_a = fx.build_dir.join("a");
        let dir_b = fx.build_dir.join("b");
        fs::create_dir_all(&dir_a)?;
        fs::create_dir_all(&dir_b)?;
        fs::write(dir_a.join("test_common.cpp.gcno"), b"meta")?;
        fs::write(dir_b.join("test_common.cpp.gcno"), b"meta")?;

        let placed = relocate_artifacts(&fx.coverage_dir, &fx.build_dir, &relocate_config(false))?;
        assert_eq!(placed, 1);
        Ok(())
    }

    #[test]
    fn all_matches_policy_copies_everywhere() -> Result<()> {
        let fx = fixture();
        fs::write(fx.coverage_dir.join("test_common.cpp.gcda"), b"data")?;
        let dir_a = fx.build_dir.join("a");
        let dir_b = fx.build_dir.join("b");
        fs::create_dir_all(&dir_a)?;
        fs::create_dir_all(&dir_b)?;
        fs::write(dir_a.join("test_common.cpp.gcno"), b"meta")?;
        fs::write(dir_b.join("test_common.cpp.gcno"), b"meta")?;

        let placed = relocate_artifacts(&fx.coverage_dir, &fx.build_dir, &relocate_config(true))?;
        assert_eq!(placed, 2);
        assert!(dir_a.join("test_common.cpp.gcda").exists());
        assert!(dir_b.join("test_common.cpp.gcda").exists());
        Ok(())
    }

    #[test]
    fn missing_coverage_dir_is_a_clean_no_op() -> Result<()> {
        let fx = fixture();
        let missing = fx.coverage_dir.join("nope");
        let placed = relocate_artifacts(&missing, &fx.build_dir, &relocate_config(false))?;
        assert_eq!(placed, 0);
        Ok(())
    }
}
