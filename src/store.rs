//! Persisted record of the installed version.
//!
//! The whole file is the version string. A missing file means nothing has been
//! installed yet, which is a normal state and not an error.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes the installed version file.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    /// Create a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored version.
    ///
    /// Returns `Ok(None)` when no version has been recorded. An empty file is
    /// treated the same way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read.
    pub fn read(&self) -> Result<Option<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No version file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read version file '{}': {e}",
                    self.path.display()
                )))
            }
        };

        let version = content.trim();
        if version.is_empty() {
            warn!(
                "Version file {} is empty, treating as not installed",
                self.path.display()
            );
            return Ok(None);
        }

        Ok(Some(version.to_string()))
    }

    /// Replace the stored version.
    ///
    /// The new content is written to a sibling temporary file, synced, and
    /// renamed over the old file so readers see either the old or the new value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file cannot be written.
    pub fn write(&self, version: &str) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        std::fs::create_dir_all(&parent).map_err(|e| {
            Error::Storage(format!(
                "Failed to create directory '{}': {e}",
                parent.display()
            ))
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| {
            Error::Storage(format!(
                "Failed to create temp file in '{}': {e}",
                parent.display()
            ))
        })?;

        tmp.write_all(version.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::Storage(format!("Failed to write version: {e}")))?;

        tmp.persist(&self.path).map_err(|e| {
            Error::Storage(format!(
                "Failed to replace version file '{}': {}",
                self.path.display(),
                e.error
            ))
        })?;

        debug!("Recorded version {} in {}", version, self.path.display());
        Ok(())
    }
}
