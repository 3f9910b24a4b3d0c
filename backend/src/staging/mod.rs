//! Staging directory for pipeline runs.
//!
//! The raw input is written verbatim to a file in the staging directory so
//! the native engine can read it. Two naming modes exist:
//!
//! - [`StagingMode::Fixed`]: `input_data.txt` / `output.h5`, overwritten on
//!   every run. Fine for a single user.
//! - [`StagingMode::PerRequest`]: names unique to the run, removed once the
//!   run is over. Required as soon as runs can overlap.
//!
//! Every name goes through [`validate_filename`] before it becomes a path,
//! and the directory is resolved to an absolute path up front, so the engine
//! only ever receives absolute paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::logs::log_warning;
use crate::error::{PipelineError, StagingError, StagingResult};
use crate::validation::validate_filename;

/// Fixed input file name
pub const INPUT_FILE: &str = "input_data.txt";

/// Fixed output file name
pub const OUTPUT_FILE: &str = "output.h5";

/// How staging file names are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StagingMode {
    /// Same names every run
    #[default]
    Fixed,
    /// Unique names per run, cleaned up afterwards
    PerRequest,
}

/// Absolute input and output paths of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedPaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// A resolved staging directory
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create the directory if needed and resolve it to an absolute path.
    pub async fn open(dir: impl AsRef<Path>) -> StagingResult<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        let dir = tokio::fs::canonicalize(dir)
            .await
            .map_err(|source| StagingError::Resolve {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Join a validated file name onto the staging directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, PipelineError> {
        let name = validate_filename(name)?;
        Ok(self.dir.join(name))
    }

    /// Input and output paths for a run in the given mode.
    pub fn paths(&self, mode: StagingMode) -> Result<StagedPaths, PipelineError> {
        let (input, output) = match mode {
            StagingMode::Fixed => (INPUT_FILE.to_string(), OUTPUT_FILE.to_string()),
            StagingMode::PerRequest => {
                let id = Uuid::new_v4().simple();
                (format!("input_{id}.txt"), format!("output_{id}.h5"))
            }
        };
        Ok(StagedPaths {
            input: self.path_for(&input)?,
            output: self.path_for(&output)?,
        })
    }

    /// Write the raw input verbatim, replacing any previous content.
    pub async fn write_input(&self, paths: &StagedPaths, text: &str) -> StagingResult<()> {
        tokio::fs::write(&paths.input, text)
            .await
            .map_err(|source| StagingError::Write {
                path: paths.input.clone(),
                source,
            })
    }

    /// Read the staged input back.
    pub async fn read_input(&self, paths: &StagedPaths) -> StagingResult<String> {
        tokio::fs::read_to_string(&paths.input)
            .await
            .map_err(|source| StagingError::Read {
                path: paths.input.clone(),
                source,
            })
    }

    /// Remove the files of a run. Missing files are not an error.
    pub async fn cleanup(&self, paths: &StagedPaths) {
        for path in [&paths.input, &paths.output] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log_warning(format!("Could not remove {}: {}", path.display(), e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_and_resolves() {
        let root = tempdir().unwrap();
        let area = StagingArea::open(root.path().join("nested/data")).await.unwrap();
        assert!(area.dir().is_absolute());
        assert!(area.dir().is_dir());
    }

    #[tokio::test]
    async fn test_open_fails_on_file() {
        let root = tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let err = StagingArea::open(&file).await.unwrap_err();
        assert!(matches!(err, StagingError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn test_fixed_paths() {
        let root = tempdir().unwrap();
        let area = StagingArea::open(root.path()).await.unwrap();
        let paths = area.paths(StagingMode::Fixed).unwrap();
        assert_eq!(paths.input, area.dir().join("input_data.txt"));
        assert_eq!(paths.output, area.dir().join("output.h5"));
        assert!(paths.input.is_absolute());
    }

    #[tokio::test]
    async fn test_per_request_paths_are_unique() {
        let root = tempdir().unwrap();
        let area = StagingArea::open(root.path()).await.unwrap();
        let a = area.paths(StagingMode::PerRequest).unwrap();
        let b = area.paths(StagingMode::PerRequest).unwrap();
        assert_ne!(a.input, b.input);
        assert_ne!(a.output, b.output);
        assert_eq!(a.input.parent(), Some(area.dir()));
    }

    #[tokio::test]
    async fn test_path_for_rejects_traversal() {
        let root = tempdir().unwrap();
        let area = StagingArea::open(root.path()).await.unwrap();
        let err = area.path_for("../escape.txt").unwrap_err();
        assert!(matches!(err, PipelineError::Name(_)));
    }

    #[tokio::test]
    async fn test_write_read_cleanup() {
        let root = tempdir().unwrap();
        let area = StagingArea::open(root.path()).await.unwrap();
        let paths = area.paths(StagingMode::PerRequest).unwrap();

        area.write_input(&paths, "1 2\n3").await.unwrap();
        assert_eq!(area.read_input(&paths).await.unwrap(), "1 2\n3");

        // Second write overwrites
        area.write_input(&paths, "4").await.unwrap();
        assert_eq!(area.read_input(&paths).await.unwrap(), "4");

        area.cleanup(&paths).await;
        assert!(!paths.input.exists());
        assert!(!paths.output.exists());
    }
}
