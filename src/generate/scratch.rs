//! Staging directory for generated files.

use crate::error::{GenError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const PREFIX: &str = ".gomono-";

/// A temporary directory next to the output directory. Files are written
/// here first and only moved into the output once they are verified. The
/// directory is removed when the value is dropped.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch directory in the parent of `output`, so the final
    /// move stays on one filesystem.
    pub fn create(output: &Path) -> Result<Self> {
        let parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(parent)
            .map_err(|e| GenError::io(parent, e))?;
        debug!("scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).map_err(|e| GenError::io(&path, e))?;
        Ok(path)
    }

    /// Move every file into `output`, creating it if needed. Returns the
    /// published paths in name order.
    pub fn publish(self, output: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output).map_err(|e| GenError::io(output, e))?;

        let mut names = Vec::new();
        let entries = fs::read_dir(self.path()).map_err(|e| GenError::io(self.path(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| GenError::io(self.path(), e))?;
            names.push(entry.file_name());
        }
        names.sort();

        let mut published = Vec::with_capacity(names.len());
        for name in names {
            let from = self.path().join(&name);
            let to = output.join(&name);
            debug!("moving {} to {}", from.display(), to.display());
            fs::rename(&from, &to).map_err(|e| GenError::io(&to, e))?;
            published.push(to);
        }
        Ok(published)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        debug!("cleaning up {}", self.dir.path().display());
    }
}
