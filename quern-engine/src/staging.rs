//! Staging area for one job iteration
//!
//! An ephemeral directory tree holding a job's inputs, outputs, and
//! side-channel metadata, plus the derived container bind set. The area
//! lives for exactly one execute-and-collect phase: dropping the value
//! removes the whole tree, on success and error paths alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One host-to-container bind mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    pub host: PathBuf,
    pub container: &'static str,
    pub read_only: bool,
}

/// Scoped working directory for a single job.
///
/// Layout:
/// ```text
/// <root>/input        downloaded artifacts
/// <root>/output       container-produced artifacts
/// <root>/meta/input   reserved for job/IO metadata
/// <root>/meta/output  reserved for job/IO metadata
/// ```
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Creates the staging directory tree.
    pub fn create() -> Result<Self> {
        let dir = TempDir::with_prefix("quern-").context("failed to create staging directory")?;

        std::fs::create_dir(dir.path().join("input"))?;
        std::fs::create_dir(dir.path().join("output"))?;
        std::fs::create_dir_all(dir.path().join("meta").join("input"))?;
        std::fs::create_dir(dir.path().join("meta").join("output"))?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.dir.path().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.dir.path().join("meta")
    }

    /// Bind set for the job container.
    ///
    /// `/scratch` is always read-only; the staging-backed mounts are
    /// read-write from the container's perspective.
    pub fn binds(&self, scratch: &Path) -> Vec<Bind> {
        vec![
            Bind {
                host: scratch.to_path_buf(),
                container: "/scratch",
                read_only: true,
            },
            Bind {
                host: self.input_dir(),
                container: "/input",
                read_only: false,
            },
            Bind {
                host: self.output_dir(),
                container: "/output",
                read_only: false,
            },
            Bind {
                host: self.meta_dir(),
                container: "/meta",
                read_only: false,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_fixed_subdirectories() {
        let staging = StagingArea::create().unwrap();
        assert!(staging.input_dir().is_dir());
        assert!(staging.output_dir().is_dir());
        assert!(staging.meta_dir().join("input").is_dir());
        assert!(staging.meta_dir().join("output").is_dir());
    }

    #[test]
    fn drop_removes_the_tree() {
        let staging = StagingArea::create().unwrap();
        let root = staging.path().to_path_buf();
        std::fs::write(staging.output_dir().join("result.nii.gz"), b"data").unwrap();

        drop(staging);
        assert!(!root.exists());
    }

    #[test]
    fn only_scratch_is_read_only() {
        let staging = StagingArea::create().unwrap();
        let binds = staging.binds(Path::new("/srv/scratch"));

        assert_eq!(binds.len(), 4);
        assert_eq!(binds[0].container, "/scratch");
        assert!(binds[0].read_only);
        assert_eq!(binds[0].host, PathBuf::from("/srv/scratch"));

        for bind in &binds[1..] {
            assert!(!bind.read_only, "{} must be writable", bind.container);
        }
        let containers: Vec<_> = binds.iter().map(|b| b.container).collect();
        assert_eq!(containers, ["/scratch", "/input", "/output", "/meta"]);
    }
}
