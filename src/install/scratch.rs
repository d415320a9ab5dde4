//! Per-run scratch space.
//!
//! Each run works inside its own uniquely named directory under the scratch
//! root. Directories left behind by an interrupted run carry the same prefix
//! and are swept at the start of the next run.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name prefix of attempt directories.
pub const ATTEMPT_PREFIX: &str = ".attempt-";

/// Scratch directory owned by a single update run.
#[derive(Debug)]
pub struct Attempt {
    dir: TempDir,
}

impl Attempt {
    /// Create a fresh attempt directory under `scratch_root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the directories cannot be created.
    pub fn begin(scratch_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(scratch_root).map_err(|e| {
            Error::Storage(format!(
                "Failed to create scratch root '{}': {e}",
                scratch_root.display()
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(ATTEMPT_PREFIX)
            .tempdir_in(scratch_root)
            .map_err(|e| {
                Error::Storage(format!(
                    "Failed to create attempt directory in '{}': {e}",
                    scratch_root.display()
                ))
            })?;

        let attempt = Self { dir };
        std::fs::create_dir(attempt.download_dir()).map_err(|e| {
            Error::Storage(format!("Failed to create download directory: {e}"))
        })?;

        debug!("Began attempt in {}", attempt.path().display());
        Ok(attempt)
    }

    /// Root of this attempt.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where downloaded archives are written.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.path().join("download")
    }

    /// Where the archive is extracted.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.path().join("staging")
    }

    /// Where the replacement installation is assembled.
    #[must_use]
    pub fn candidate_dir(&self) -> PathBuf {
        self.path().join("candidate")
    }

    /// Where the previous installation is moved before the swap.
    #[must_use]
    pub fn retired_dir(&self) -> PathBuf {
        self.path().join("retired")
    }

    /// Remove the attempt directory and everything in it.
    ///
    /// Failures are logged, not returned.
    pub fn finish(self) {
        let path = self.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed attempt directory {}", path.display()),
            Err(e) => warn!("Failed to remove scratch directory {}: {}", path.display(), e),
        }
    }
}

/// Remove attempt directories left behind by interrupted runs.
///
/// Returns how many were removed. Failures are logged, not returned.
#[must_use]
pub fn sweep_stale(scratch_root: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(scratch_root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(ATTEMPT_PREFIX) {
            continue;
        }

        let path = entry.path();
        let result = match entry.file_type() {
            Ok(t) if t.is_dir() => std::fs::remove_dir_all(&path),
            _ => std::fs::remove_file(&path),
        };

        match result {
            Ok(()) => {
                warn!("Removed stale scratch directory {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove stale scratch {}: {}", path.display(), e),
        }
    }

    removed
}

/// Remove a directory tree if it exists, logging failures.
pub(crate) fn remove_best_effort(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
