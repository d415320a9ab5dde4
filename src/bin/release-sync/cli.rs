//! Command-line interface definition.

use clap::Parser;
use release_sync::Config;
use std::path::PathBuf;

/// Install the latest GitHub release of a project if it is newer than the local copy.
#[derive(Parser, Debug)]
#[command(name = "release-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub repository to follow (owner/repo).
    #[arg(long, env = "RELEASE_SYNC_REPO")]
    pub repo: Option<String>,

    /// Installation directory.
    #[arg(long, env = "RELEASE_SYNC_INSTALL_DIR")]
    pub install_dir: Option<PathBuf>,

    /// File recording the installed version.
    #[arg(long, env = "RELEASE_SYNC_VERSION_FILE")]
    pub version_file: Option<PathBuf>,

    /// Scratch directory (same filesystem as the installation directory).
    #[arg(long, env = "RELEASE_SYNC_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Regular expression selecting the release asset.
    #[arg(long, env = "RELEASE_SYNC_PATTERN")]
    pub pattern: Option<String>,

    /// Log level, used when `RUST_LOG` is not set.
    #[arg(long, env = "RELEASE_SYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Convert CLI arguments into a Config.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<Config> {
        let mut config = if let Some(ref path) = self.config {
            Config::from_file(path)?
        } else {
            Config::default()
        };

        if let Some(repo) = self.repo {
            config.release.repo = repo;
        }
        if let Some(install_dir) = self.install_dir {
            config.paths.install_dir = install_dir;
        }
        if let Some(version_file) = self.version_file {
            config.paths.version_file = version_file;
        }
        if let Some(scratch_dir) = self.scratch_dir {
            config.paths.scratch_dir = scratch_dir;
        }
        if let Some(pattern) = self.pattern {
            config.asset.pattern = Some(pattern);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }
}
