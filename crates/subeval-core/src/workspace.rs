//! Temporary extraction directories with guaranteed cleanup.
//!
//! A [`Workspace`] owns one uniquely-named directory under the manager's
//! temp root. The directory is removed by [`Workspace::release`] or, on any
//! other exit path, when the handle is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ArchiveSide, EvalError, EvalResult};
use crate::obs;

/// Creates workspaces under a fixed temp root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Manager rooted at `root`, or the system temp dir when `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root: root.unwrap_or_else(std::env::temp_dir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, empty directory for one side of an evaluation.
    pub fn acquire(&self, side: ArchiveSide) -> EvalResult<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("subeval-{}-", side.as_str()))
            .tempdir_in(&self.root)
            .map_err(EvalError::Workspace)?;
        obs::emit_workspace_acquired(side, dir.path());
        Ok(Workspace { side, dir })
    }
}

/// Exclusively-owned extraction directory.
#[derive(Debug)]
pub struct Workspace {
    side: ArchiveSide,
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn side(&self) -> ArchiveSide {
        self.side
    }

    /// Remove the directory and everything under it.
    ///
    /// Never fails: removal errors (including contents that already vanished)
    /// are logged and swallowed.
    pub fn release(self) {
        let side = self.side;
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => obs::emit_workspace_released(side, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                obs::emit_workspace_released(side, &path)
            }
            Err(e) => obs::emit_workspace_release_error(side, &path, &e),
        }
    }
}
