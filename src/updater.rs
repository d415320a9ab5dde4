//! Version-gated update run.
//!
//! One call to [`Updater::run`] walks the stages
//!
//! ```text
//! CheckingRelease → LocatingAsset → ComparingVersion ─┬→ Idle
//!                                                     └→ Downloading
//!                                                          ↓
//!                              Done ← RecordingVersion ← Installing
//! ```
//!
//! Nothing local is modified before `Installing`, and the attempt's scratch
//! directory is removed in `Done` whatever happened before it.

use crate::config::{Config, PathsConfig};
use crate::error::{Error, Result};
use crate::event::{UpdateEvent, UpdateEventsSender};
use crate::install::{sweep_stale, ArchiveInstaller, Attempt};
use crate::release::{AssetMatch, ReleaseLocator, ReleaseSource};
use crate::store::VersionStore;
use crate::version::parse_version;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Stage of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    /// Fetching the latest release manifest.
    CheckingRelease,
    /// Selecting the platform asset.
    LocatingAsset,
    /// Comparing installed and released versions.
    ComparingVersion,
    /// No update needed.
    Idle,
    /// Streaming the asset to scratch space.
    Downloading,
    /// Extracting and swapping the installation.
    Installing,
    /// Persisting the new version.
    RecordingVersion,
    /// Scratch space removed.
    Done,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckingRelease => "checking-release",
            Self::LocatingAsset => "locating-asset",
            Self::ComparingVersion => "comparing-version",
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Installing => "installing",
            Self::RecordingVersion => "recording-version",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// How an update run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A newer release was installed.
    Updated {
        /// Version recorded before the run, if any.
        previous: Option<String>,
        /// Newly installed tag.
        version: String,
    },
    /// Installed version equals the latest release.
    UpToDate {
        /// Installed version.
        installed: String,
    },
    /// Installed version is newer than the latest release. Nothing is changed.
    LocalNewer {
        /// Installed version.
        installed: String,
        /// Latest release tag.
        latest: String,
    },
    /// The release has no asset matching the naming convention.
    NoMatchingAsset {
        /// Release tag.
        tag: String,
    },
}

impl UpdateOutcome {
    /// Returns true if this run installed a new version.
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Keeps an installation directory at the latest release.
pub struct Updater<S> {
    source: S,
    locator: ReleaseLocator,
    store: VersionStore,
    installer: ArchiveInstaller,
    scratch_dir: PathBuf,
    events: Option<UpdateEventsSender>,
}

impl<S: ReleaseSource> Updater<S> {
    /// Create an updater over explicit paths.
    #[must_use]
    pub fn new(source: S, locator: ReleaseLocator, paths: &PathsConfig) -> Self {
        Self {
            source,
            locator,
            store: VersionStore::new(paths.version_file.clone()),
            installer: ArchiveInstaller::new(paths.install_dir.clone()),
            scratch_dir: paths.scratch_dir.clone(),
            events: None,
        }
    }

    /// Create an updater from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the asset pattern is invalid.
    pub fn from_config(source: S, config: &Config) -> Result<Self> {
        Ok(Self::new(source, config.asset.locator()?, &config.paths))
    }

    /// Publish progress on `events`.
    #[must_use]
    pub fn with_events(mut self, events: UpdateEventsSender) -> Self {
        self.events = Some(events);
        self
    }

    /// The version store in use.
    #[must_use]
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// The live installation directory.
    #[must_use]
    pub fn install_dir(&self) -> &Path {
        self.installer.install_dir()
    }

    /// Run one update check, installing the latest release if it is newer.
    ///
    /// "No update needed" and "no matching asset" are successful outcomes.
    ///
    /// # Errors
    ///
    /// Returns the first error that aborted the run. Errors raised before
    /// installation leave the installation and version file untouched.
    pub async fn run(&self) -> Result<UpdateOutcome> {
        let result = self.run_stages().await;
        if let Err(ref e) = result {
            error!("Update failed: {}", e);
            self.emit(UpdateEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }

    async fn run_stages(&self) -> Result<UpdateOutcome> {
        let stale = sweep_stale(&self.scratch_dir);
        if stale > 0 {
            debug!("Swept {} stale attempt directories", stale);
        }

        enter(UpdateStage::CheckingRelease);
        let manifest = self.source.latest_release().await?;
        let tag = manifest.tag;
        self.emit(UpdateEvent::ReleaseChecked { tag: tag.clone() });

        enter(UpdateStage::LocatingAsset);
        let Some(asset) = self.locator.find_asset(&manifest.assets) else {
            error!("No matching asset found in release {}", tag);
            self.emit(UpdateEvent::NoMatchingAsset { tag: tag.clone() });
            return Ok(UpdateOutcome::NoMatchingAsset { tag });
        };

        enter(UpdateStage::ComparingVersion);
        let latest = parse_version(&tag)?;
        if let Some(ref captured) = asset.version {
            if *captured != latest {
                warn!(
                    "Asset {} carries version {} but release is tagged {}",
                    asset.name, captured, tag
                );
            }
        }

        let installed = self.installed_version()?;
        if let Some((ref raw, ref version)) = installed {
            match version.cmp(&latest) {
                Ordering::Greater => {
                    warn!(
                        "Installed version {} is newer than latest release {}, leaving it in place",
                        raw, tag
                    );
                    enter(UpdateStage::Idle);
                    self.emit(UpdateEvent::LocalNewer {
                        installed: raw.clone(),
                        latest: tag.clone(),
                    });
                    return Ok(UpdateOutcome::LocalNewer {
                        installed: raw.clone(),
                        latest: tag,
                    });
                }
                Ordering::Equal => {
                    info!("No new version available ({} is installed)", raw);
                    enter(UpdateStage::Idle);
                    self.emit(UpdateEvent::UpToDate {
                        installed: raw.clone(),
                        latest: tag,
                    });
                    return Ok(UpdateOutcome::UpToDate {
                        installed: raw.clone(),
                    });
                }
                Ordering::Less => {}
            }
        }

        info!("New version available: {}", tag);
        self.emit(UpdateEvent::UpdateAvailable {
            version: tag.clone(),
        });

        let attempt = Attempt::begin(&self.scratch_dir)?;
        let (attempt, result) = self.download_and_install(&asset, attempt).await;

        let result = result.and_then(|()| {
            self.emit(UpdateEvent::InstallComplete {
                version: tag.clone(),
            });
            enter(UpdateStage::RecordingVersion);
            info!("Updating local version to {}", tag);
            self.store.write(&tag)
        });

        enter(UpdateStage::Done);
        if let Some(attempt) = attempt {
            attempt.finish();
        }
        result?;

        info!("Update complete");
        self.emit(UpdateEvent::UpdateComplete {
            version: tag.clone(),
        });
        Ok(UpdateOutcome::Updated {
            previous: installed.map(|(raw, _)| raw),
            version: tag,
        })
    }

    /// Download the asset into `attempt` and install it.
    ///
    /// Hands the attempt back so the caller can clean it up; it is only lost
    /// if the blocking install task itself dies, in which case dropping it
    /// removes the directory.
    async fn download_and_install(
        &self,
        asset: &AssetMatch,
        attempt: Attempt,
    ) -> (Option<Attempt>, Result<()>) {
        enter(UpdateStage::Downloading);
        let archive = attempt.download_dir().join(archive_file_name(&asset.name));
        info!(
            "Downloading {} to {}",
            asset.download_url,
            archive.display()
        );
        if let Err(e) = self.source.download(&asset.download_url, &archive).await {
            return (Some(attempt), Err(e));
        }
        self.emit(UpdateEvent::DownloadComplete {
            asset: asset.name.clone(),
        });

        enter(UpdateStage::Installing);
        info!(
            "Extracting {} to {}",
            archive.display(),
            self.installer.install_dir().display()
        );
        let installer = self.installer.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = installer.install(&archive, &attempt);
            (attempt, result)
        });

        match task.await {
            Ok((attempt, result)) => (Some(attempt), result),
            Err(e) => (None, Err(Error::Storage(format!("Install task failed: {e}")))),
        }
    }

    /// Read and parse the installed version.
    ///
    /// A value that does not parse is treated as not installed so the next
    /// release overwrites it.
    fn installed_version(&self) -> Result<Option<(String, Version)>> {
        let Some(raw) = self.store.read()? else {
            return Ok(None);
        };

        match parse_version(&raw) {
            Ok(version) => Ok(Some((raw, version))),
            Err(e) => {
                warn!("Ignoring unreadable installed version: {}", e);
                Ok(None)
            }
        }
    }

    fn emit(&self, event: UpdateEvent) {
        if let Some(ref events) = self.events {
            let _ = events.send(event);
        }
    }
}

fn enter(stage: UpdateStage) {
    debug!("Update stage: {}", stage);
}

/// File name to store a downloaded asset under.
fn archive_file_name(asset_name: &str) -> &str {
    Path::new(asset_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("release.tar.gz")
}
