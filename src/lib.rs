//! # release-sync
//!
//! Keeps a local installation directory in sync with the latest GitHub
//! release of a project.
//!
//! ## Features
//!
//! - **Version gated**: only a strictly newer release (semantic versioning)
//!   replaces the installation
//! - **Atomic from the outside**: archives are extracted and assembled in
//!   per-run scratch space and swapped into place with renames
//! - **Safe extraction**: entries and links that would escape the staging
//!   area abort the install
//! - **Idempotent**: a second run against the same release changes nothing
//!
//! ## Example
//!
//! ```rust,ignore
//! use release_sync::{Config, GitHubReleases, Updater};
//!
//! let config = Config::default();
//! let source = GitHubReleases::new(&config.release, &config.http)?;
//! let outcome = Updater::from_config(source, &config)?.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod install;
pub mod release;
pub mod store;
pub mod updater;
pub mod version;

pub use config::{AssetConfig, Config, HttpConfig, PathsConfig, ReleaseConfig};
pub use error::{Error, Result};
pub use event::{create_event_channel, UpdateEvent, UpdateEventsChannel, UpdateEventsSender};
pub use install::ArchiveInstaller;
pub use release::{Asset, GitHubReleases, ReleaseLocator, ReleaseManifest, ReleaseSource};
pub use store::VersionStore;
pub use updater::{UpdateOutcome, UpdateStage, Updater};
pub use version::{compare_versions, parse_version};
