//! GitHub releases client.

use crate::config::{HttpConfig, ReleaseConfig};
use crate::error::{Error, Result};
use crate::release::{Asset, ReleaseManifest, ReleaseSource};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Release payload as returned by the GitHub API.
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

impl From<GitHubRelease> for ReleaseManifest {
    fn from(release: GitHubRelease) -> Self {
        Self {
            tag: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| Asset::new(a.name, a.browser_download_url))
                .collect(),
        }
    }
}

/// Queries the latest release of a GitHub repository.
pub struct GitHubReleases {
    /// GitHub repository (owner/repo format).
    repo: String,
    /// API root, without trailing slash.
    api_url: String,
    /// Optional bearer token.
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubReleases {
    /// Create a client for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(release: &ReleaseConfig, http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            repo: release.repo.clone(),
            api_url: release.api_url.trim_end_matches('/').to_string(),
            token: http.token.clone(),
            client,
        })
    }

    /// Get the tracked repository.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn latest_release_url(&self) -> String {
        format!("{}/repos/{}/releases/latest", self.api_url, self.repo)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self) -> Result<ReleaseManifest> {
        let url = self.latest_release_url();
        debug!("Fetching latest release from {}", url);

        let response = self
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to query {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "Release query for {} returned {status}",
                self.repo
            )));
        }

        let release: GitHubRelease = response.json().await.map_err(|e| {
            Error::Network(format!("Failed to decode release for {}: {e}", self.repo))
        })?;

        info!(
            "Latest release of {} is {} ({} assets)",
            self.repo,
            release.tag_name,
            release.assets.len()
        );
        Ok(release.into())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("Downloading {} to {}", url, dest.display());

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to download {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("Download of {url} returned {status}")));
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            Error::Storage(format!("Failed to create '{}': {e}", dest.display()))
        })?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes =
                chunk.map_err(|e| Error::Network(format!("Download of {url} interrupted: {e}")))?;
            file.write_all(&chunk).await.map_err(|e| {
                Error::Storage(format!("Failed to write '{}': {e}", dest.display()))
            })?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| {
            Error::Storage(format!("Failed to flush '{}': {e}", dest.display()))
        })?;

        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }
}
