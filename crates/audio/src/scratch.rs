//! Run-scoped temporary files.

use std::path::{Path, PathBuf};

use clipcast_common::error::ClipcastResult;
use tempfile::TempDir;

/// A temporary directory removed when dropped, on success and error paths
/// alike. Removal failures are logged and ignored.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir.
    pub fn new(label: &str) -> ClipcastResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("clipcast-{label}-"))
            .tempdir()?;
        let path = dir.path().to_path_buf();
        tracing::trace!(path = %path.display(), "Created scratch directory");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` to `name` inside the directory.
    pub fn write(&self, name: &str, bytes: &[u8]) -> ClipcastResult<PathBuf> {
        let path = self.path.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Path for a file a tool will create.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(err) = dir.close() {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "Failed to remove scratch directory"
                );
            }
        }
    }
}
