//! Error types for release-sync.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an update run.
///
/// Every variant is terminal for the current run. Retrying is left to whatever
/// scheduled the run.
#[derive(Debug, Error)]
pub enum Error {
    /// Release metadata fetch or asset download failed.
    #[error("Network error: {0}")]
    Network(String),

    /// Archive is corrupt, escapes the staging area, or has an unexpected layout.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Version file or installation path could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A release tag could not be parsed as a semantic version.
    #[error("Version error: {0}")]
    Version(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error cannot have touched the live installation.
    ///
    /// Network, version and configuration failures happen before the
    /// installer runs. Archive failures abort before the swap. Storage and
    /// I/O errors may come from the swap or the version write, so they are
    /// not covered.
    #[must_use]
    pub fn is_pre_install(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Archive(_) | Self::Version(_) | Self::Config(_)
        )
    }
}
