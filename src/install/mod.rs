//! Archive installation with atomic directory replacement.
//!
//! This module handles:
//! - Extracting the downloaded archive into attempt-scoped staging
//! - Unwrapping the single top-level directory the upstream packaging adds
//! - Assembling the replacement next to the live installation
//! - Swapping it into place with renames, so the live path never holds a
//!   partially written tree

mod extract;
mod scratch;

pub use extract::extract_archive;
pub use scratch::{sweep_stale, Attempt, ATTEMPT_PREFIX};

use crate::error::{Error, Result};
use extract::check_links;
use scratch::remove_best_effort;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Installs release archives into a fixed directory.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    install_dir: PathBuf,
}

impl ArchiveInstaller {
    /// Create an installer targeting `install_dir`.
    #[must_use]
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    /// The live installation directory.
    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Install `archive`, replacing any existing installation.
    ///
    /// Extraction and assembly happen entirely inside `attempt`. The live
    /// directory is touched only after the replacement is complete. Staging,
    /// candidate and retired trees are removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] for a corrupt or malformed archive and
    /// [`Error::Storage`] if the scratch area or installation path cannot be
    /// written. On any error before the swap the existing installation is left
    /// as it was.
    pub fn install(&self, archive: &Path, attempt: &Attempt) -> Result<()> {
        let staging = attempt.staging_dir();
        let candidate = attempt.candidate_dir();
        let retired = attempt.retired_dir();

        let result = self
            .assemble(archive, &staging, &candidate)
            .and_then(|()| self.swap(&candidate, &retired));

        remove_best_effort(&staging);
        remove_best_effort(&candidate);
        remove_best_effort(&retired);

        result
    }

    /// Extract into `staging` and move the unwrapped payload into `candidate`.
    fn assemble(&self, archive: &Path, staging: &Path, candidate: &Path) -> Result<()> {
        std::fs::create_dir_all(staging).map_err(|e| {
            Error::Storage(format!(
                "Failed to create staging directory '{}': {e}",
                staging.display()
            ))
        })?;

        debug!("Extracting {} into {}", archive.display(), staging.display());
        extract_archive(archive, staging)?;

        let payload = single_top_level_dir(staging)?;
        check_links(&payload)?;
        debug!("Unwrapping {}", payload.display());

        std::fs::create_dir(candidate).map_err(|e| {
            Error::Storage(format!(
                "Failed to create candidate directory '{}': {e}",
                candidate.display()
            ))
        })?;

        let entries = std::fs::read_dir(&payload)
            .and_then(|dir| dir.collect::<std::io::Result<Vec<_>>>())
            .map_err(|e| {
                Error::Storage(format!("Failed to read '{}': {e}", payload.display()))
            })?;

        for entry in entries {
            let target = candidate.join(entry.file_name());
            std::fs::rename(entry.path(), &target).map_err(|e| {
                Error::Storage(format!(
                    "Failed to move '{}' into candidate: {e}",
                    entry.path().display()
                ))
            })?;
        }

        Ok(())
    }

    /// Replace the live directory with `candidate`.
    ///
    /// The previous installation is renamed to `retired` first and renamed
    /// back if the candidate cannot be moved into place.
    fn swap(&self, candidate: &Path, retired: &Path) -> Result<()> {
        if let Some(parent) = self.install_dir.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!(
                        "Failed to create '{}': {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let had_previous = match std::fs::symlink_metadata(&self.install_dir) {
            Ok(_) => {
                debug!(
                    "Retiring existing installation {}",
                    self.install_dir.display()
                );
                std::fs::rename(&self.install_dir, retired).map_err(|e| {
                    Error::Storage(format!(
                        "Failed to move existing installation '{}' aside: {e}",
                        self.install_dir.display()
                    ))
                })?;
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to inspect '{}': {e}",
                    self.install_dir.display()
                )))
            }
        };

        if let Err(e) = std::fs::rename(candidate, &self.install_dir) {
            if had_previous {
                if let Err(restore) = std::fs::rename(retired, &self.install_dir) {
                    error!(
                        "Failed to restore previous installation to {}: {}",
                        self.install_dir.display(),
                        restore
                    );
                }
            }
            return Err(Error::Storage(format!(
                "Failed to move new installation into '{}': {e}",
                self.install_dir.display()
            )));
        }

        info!("Installed new files into {}", self.install_dir.display());
        Ok(())
    }
}

/// Return the only entry of `staging`, which must be a directory.
fn single_top_level_dir(staging: &Path) -> Result<PathBuf> {
    let mut entries = std::fs::read_dir(staging)
        .and_then(|dir| dir.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| Error::Storage(format!("Failed to read '{}': {e}", staging.display())))?;

    if entries.len() != 1 {
        return Err(Error::Archive(format!(
            "Expected a single top-level directory, found {} entries",
            entries.len()
        )));
    }

    let Some(entry) = entries.pop() else {
        return Err(Error::Archive("Archive is empty".to_string()));
    };

    let is_dir = entry
        .file_type()
        .map(|t| t.is_dir())
        .map_err(|e| {
            Error::Storage(format!("Failed to inspect '{}': {e}", entry.path().display()))
        })?;

    if !is_dir {
        return Err(Error::Archive(format!(
            "Top-level entry '{}' is not a directory",
            entry.file_name().to_string_lossy()
        )));
    }

    Ok(entry.path())
}
