// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-handler temp directories with guaranteed removal.

use std::path::{Path, PathBuf};
use tracing::warn;

use retrace_core::id::{IdGen, UuidIdGen};

/// A scoped temp directory under the worker's temp root.
///
/// Removed recursively on drop, which covers every handler exit path:
/// success, error and cancellation.
pub struct TempScope {
    path: PathBuf,
}

impl TempScope {
    /// Create a fresh scope directory under `root/<role>/`.
    pub fn create(root: &Path, role: &str) -> std::io::Result<Self> {
        let dir = root.join(role).join(UuidIdGen.next_id());
        std::fs::create_dir_all(&dir)?;
        Ok(Self { path: dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the scope.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create a named subdirectory inside the scope.
    pub fn subdir(&self, name: &str) -> std::io::Result<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "temp scope removal failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "tempdir_tests.rs"]
mod tests;
