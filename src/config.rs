//! Configuration for release-sync.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Which repository to follow.
    #[serde(default)]
    pub release: ReleaseConfig,

    /// How to recognise the platform archive.
    #[serde(default)]
    pub asset: AssetConfig,

    /// Local paths.
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Release host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// GitHub repository (owner/repo format).
    #[serde(default = "default_repo")]
    pub repo: String,

    /// GitHub API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

/// Asset naming configuration.
///
/// Assets are named `<product>_<major>.<minor>.<patch>_<os>_<arch>.tar.gz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Product prefix of the asset name.
    #[serde(default = "default_product")]
    pub product: String,

    /// Operating system as spelled in asset names.
    #[serde(default = "default_os")]
    pub os: String,

    /// Architecture as spelled in asset names.
    #[serde(default = "default_arch")]
    pub arch: String,

    /// Full regular expression overriding the naming convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Filesystem locations used by an update run.
///
/// `scratch_dir` must be on the same filesystem as `install_dir`: the
/// installation is swapped in by renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Live installation directory.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// File holding the installed version.
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    /// Root for per-run scratch directories.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (covers the whole download).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token for the release API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            release: ReleaseConfig::default(),
            asset: AssetConfig::default(),
            paths: PathsConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            api_url: default_api_url(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            os: default_os(),
            arch: default_arch(),
            pattern: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            version_file: default_version_file(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl AssetConfig {
    /// Build the locator for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn locator(&self) -> crate::Result<crate::release::ReleaseLocator> {
        match self.pattern {
            Some(ref pattern) => crate::release::ReleaseLocator::new(pattern),
            None => {
                crate::release::ReleaseLocator::for_platform(&self.product, &self.os, &self.arch)
            }
        }
    }
}

fn default_repo() -> String {
    "fatedier/frp".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_product() -> String {
    "frp".to_string()
}

/// Host OS as spelled in Go-style release names.
fn default_os() -> String {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
    .to_string()
}

/// Host architecture as spelled in Go-style release names.
fn default_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
    .to_string()
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("frp")
}

fn default_version_file() -> PathBuf {
    PathBuf::from("local_version.txt")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_user_agent() -> String {
    format!("release-sync/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_timeout_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
