// src/stage/mod.rs

//! Staged installation
//!
//! `make install` never writes into the final prefix. It installs into a
//! [`StageRoot`], a temporary directory owned by exactly one cook, and the
//! promotion rules then pick files out of it. The stage is removed when the
//! cook ends unless the kitchen is configured to keep it for debugging.

mod promote;

pub use promote::{
    promote, Origin, PromotedEntry, PromotionReport, PromotionRule, SourceGlob,
};

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Temporary install root for one cook
#[derive(Debug)]
pub struct StageRoot {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl StageRoot {
    /// Create a fresh, empty stage root
    ///
    /// With `parent` set the directory is created there instead of the
    /// system temp dir.
    pub fn create(parent: Option<&Path>, keep: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("saucier-stage-");

        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!("Created stage root {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `make install` left anything behind
    pub fn is_empty(&self) -> Result<bool> {
        Ok(fs::read_dir(&self.path)?.next().is_none())
    }
}

impl Drop for StageRoot {
    fn drop(&mut self) {
        if self.keep
            && let Some(dir) = self.dir.take()
        {
            let path = dir.keep();
            info!("Keeping stage root at {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_root_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let stage = StageRoot::create(Some(parent.path()), false).unwrap();
        let path = stage.path().to_path_buf();
        assert!(path.is_dir());
        assert!(stage.is_empty().unwrap());
        drop(stage);
        assert!(!path.exists());
    }

    #[test]
    fn test_stage_root_kept() {
        let parent = tempfile::tempdir().unwrap();
        let stage = StageRoot::create(Some(parent.path()), true).unwrap();
        let path = stage.path().to_path_buf();
        fs::write(path.join("marker"), "x").unwrap();
        assert!(!stage.is_empty().unwrap());
        drop(stage);
        assert!(path.join("marker").exists());
    }

    #[test]
    fn test_stage_roots_are_unique() {
        let a = StageRoot::create(None, false).unwrap();
        let b = StageRoot::create(None, false).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
