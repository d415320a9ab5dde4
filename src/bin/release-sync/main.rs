//! release-sync CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use release_sync::{GitHubReleases, UpdateOutcome, Updater};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.into_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("release-sync v{}", env!("CARGO_PKG_VERSION"));

    let source = GitHubReleases::new(&config.release, &config.http)?;
    info!("Following {}", source.repo());

    let updater = Updater::from_config(source, &config)?;

    let outcome = match updater.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_pre_install() {
                warn!("Installation and version file were left untouched");
            }
            return Err(e.into());
        }
    };

    match outcome {
        UpdateOutcome::Updated { previous, version } => match previous {
            Some(previous) => info!("Updated {} -> {}", previous, version),
            None => info!("Installed {}", version),
        },
        UpdateOutcome::UpToDate { installed } => info!("{} is up to date", installed),
        UpdateOutcome::LocalNewer { installed, latest } => {
            info!("Keeping {} (latest release is {})", installed, latest);
        }
        UpdateOutcome::NoMatchingAsset { tag } => {
            info!("Release {} has nothing for this platform", tag);
        }
    }

    Ok(())
}
