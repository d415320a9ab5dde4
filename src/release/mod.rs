//! Release metadata and the remote release host.
//!
//! This module handles:
//! - The release manifest returned by the host (tag + named assets)
//! - Selecting the platform archive among the assets
//! - Fetching the manifest and streaming an asset to disk

mod github;
mod locator;

pub use github::GitHubReleases;
pub use locator::{AssetMatch, ReleaseLocator};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// File name as published, e.g. `frp_0.61.1_linux_amd64.tar.gz`.
    pub name: String,
    /// Where the bytes can be fetched from.
    pub download_url: String,
}

impl Asset {
    /// Create a new asset.
    #[must_use]
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// The latest release as described by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseManifest {
    /// Version tag, e.g. `v0.61.1`. Must be parsed, not compared as text.
    pub tag: String,
    /// Assets in the order the host listed them.
    pub assets: Vec<Asset>,
}

/// Source of release metadata and asset bytes.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the manifest of the latest release.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Network`] if the host cannot be queried or the
    /// response cannot be decoded.
    async fn latest_release(&self) -> Result<ReleaseManifest>;

    /// Stream the asset at `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Network`] if the transfer fails.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}
