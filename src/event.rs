//! Update event system.

use tokio::sync::broadcast;

/// Events emitted while an update run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// Latest release metadata fetched.
    ReleaseChecked {
        /// Release tag.
        tag: String,
    },

    /// The release has no asset for this platform.
    NoMatchingAsset {
        /// Release tag.
        tag: String,
    },

    /// Installed version is current; nothing to do.
    UpToDate {
        /// Installed version.
        installed: String,
        /// Latest release tag.
        latest: String,
    },

    /// Installed version is newer than the latest release; left in place.
    LocalNewer {
        /// Installed version.
        installed: String,
        /// Latest release tag.
        latest: String,
    },

    /// A newer release will be installed.
    UpdateAvailable {
        /// Release tag.
        version: String,
    },

    /// Asset downloaded to scratch space.
    DownloadComplete {
        /// Asset name.
        asset: String,
    },

    /// New installation swapped into place.
    InstallComplete {
        /// Installed tag.
        version: String,
    },

    /// Installed version recorded; the run succeeded.
    UpdateComplete {
        /// New version.
        version: String,
    },

    /// Run aborted.
    Error {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving update events.
pub type UpdateEventsChannel = broadcast::Receiver<UpdateEvent>;

/// Sender for update events.
pub type UpdateEventsSender = broadcast::Sender<UpdateEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (UpdateEventsSender, UpdateEventsChannel) {
    broadcast::channel(64)
}
