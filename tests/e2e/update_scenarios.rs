//! Full update runs against the in-memory release host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{incompressible, ArchiveBuilder, TestHarness};
use release_sync::{Error, UpdateOutcome};
use std::path::Path;

const LINUX_ASSET: &str = "frp_1.5.0_linux_amd64.tar.gz";

fn release_archive(version: &str) -> Vec<u8> {
    ArchiveBuilder::new(&format!("frp_{version}_linux_amd64"))
        .file("frps", format!("frps {version}"))
        .file("frpc", format!("frpc {version}"))
        .file("conf/frps.toml", "bindPort = 7000\n")
        .build()
}

/// Install `version` so later runs start from a known installation.
async fn seed_installation(harness: &TestHarness, version: &str) {
    let asset = format!("frp_{version}_linux_amd64.tar.gz");
    harness
        .release()
        .publish(
            &format!("v{version}"),
            vec![(asset.as_str(), release_archive(version))],
        );
    assert!(harness.updater().run().await.unwrap().is_updated());
}

#[tokio::test]
async fn test_fresh_install() {
    let harness = TestHarness::new();
    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);

    let outcome = harness.updater().run().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            previous: None,
            version: "v1.5.0".to_string()
        }
    );

    let files = harness.snapshot();
    assert_eq!(files.len(), 3);
    assert_eq!(files[Path::new("frps")], b"frps 1.5.0");
    assert_eq!(files[Path::new("conf/frps.toml")], b"bindPort = 7000\n");
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.5.0");
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_up_to_date_does_nothing() {
    let harness = TestHarness::new();
    harness.store().write("v1.5.0").unwrap();
    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);

    let outcome = harness.updater().run().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            installed: "v1.5.0".to_string()
        }
    );
    assert!(harness.release().downloads().is_empty());
    assert!(harness.snapshot().is_empty());
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.5.0");
}

#[tokio::test]
async fn test_no_matching_asset_mutates_nothing() {
    let harness = TestHarness::new();
    seed_installation(&harness, "1.4.0").await;
    let files = harness.snapshot();
    let version = harness.version_file_bytes();
    assert!(!files.is_empty());

    harness.release().publish(
        "v3.0.0",
        vec![
            ("frp_3.0.0_darwin_amd64.tar.gz", release_archive("3.0.0")),
            ("frp_3.0.0_windows_amd64.zip", b"zip".to_vec()),
        ],
    );

    let outcome = harness.updater().run().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::NoMatchingAsset {
            tag: "v3.0.0".to_string()
        }
    );
    assert_eq!(harness.release().downloads().len(), 1);
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes(), version);
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let harness = TestHarness::new();
    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);

    harness.updater().run().await.unwrap();
    let files = harness.snapshot();
    let version = harness.version_file_bytes();

    let outcome = harness.updater().run().await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::UpToDate { .. }));
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes(), version);
    assert_eq!(harness.release().downloads().len(), 1);
}

#[tokio::test]
async fn test_upgrade_replaces_installation_wholesale() {
    let harness = TestHarness::new();
    harness.release().publish(
        "v1.4.0",
        vec![(
            "frp_1.4.0_linux_amd64.tar.gz",
            ArchiveBuilder::new("frp_1.4.0_linux_amd64")
                .file("frps", "frps 1.4.0")
                .file("LEGACY.md", "removed in 1.5")
                .build(),
        )],
    );
    harness.updater().run().await.unwrap();

    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);
    let outcome = harness.updater().run().await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            previous: Some("v1.4.0".to_string()),
            version: "v1.5.0".to_string()
        }
    );
    let files = harness.snapshot();
    assert!(!files.contains_key(Path::new("LEGACY.md")));
    assert_eq!(files[Path::new("frps")], b"frps 1.5.0");
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.5.0");
}

#[tokio::test]
async fn test_versions_compare_numerically() {
    let harness = TestHarness::new();
    seed_installation(&harness, "1.9.0").await;

    harness.release().publish(
        "v1.10.0",
        vec![("frp_1.10.0_linux_amd64.tar.gz", release_archive("1.10.0"))],
    );
    let outcome = harness.updater().run().await.unwrap();
    assert!(outcome.is_updated(), "{outcome:?}");
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.10.0");
}

#[tokio::test]
async fn test_local_newer_is_kept() {
    let harness = TestHarness::new();
    seed_installation(&harness, "2.0.0").await;
    let files = harness.snapshot();

    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);
    let outcome = harness.updater().run().await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::LocalNewer { .. }));
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes().unwrap(), b"v2.0.0");
}

#[tokio::test]
async fn test_truncated_archive_leaves_installation_intact() {
    let harness = TestHarness::new();
    seed_installation(&harness, "1.4.0").await;
    let files = harness.snapshot();

    let mut archive = ArchiveBuilder::new("frp_1.5.0_linux_amd64")
        .file("frps", incompressible(256 * 1024, 7))
        .file("frpc", incompressible(256 * 1024, 11))
        .build();
    archive.truncate(archive.len() / 2);
    harness.release().publish("v1.5.0", vec![(LINUX_ASSET, archive)]);

    let result = harness.updater().run().await;
    assert!(matches!(result, Err(Error::Archive(_))), "{result:?}");
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.4.0");
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_path_escape_is_rejected() {
    let harness = TestHarness::new();
    seed_installation(&harness, "1.4.0").await;
    let files = harness.snapshot();

    let archive = ArchiveBuilder::new("frp_1.5.0_linux_amd64")
        .file("frps", "frps 1.5.0")
        .raw_entry("../../escaped", "owned")
        .build();
    harness.release().publish("v1.5.0", vec![(LINUX_ASSET, archive)]);

    let result = harness.updater().run().await;
    assert!(matches!(result, Err(Error::Archive(_))), "{result:?}");
    assert!(!harness.root().join("escaped").exists());
    assert!(!harness.root().join("temp/escaped").exists());
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.4.0");
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_first_matching_asset_wins() {
    let harness = TestHarness::new();
    harness.release().publish(
        "v1.5.0",
        vec![
            ("frp_1.5.0_darwin_arm64.tar.gz", release_archive("1.5.0")),
            (LINUX_ASSET, release_archive("1.5.0")),
            ("frp_1.5.0_linux_amd64.tar.gz.sig", b"sig".to_vec()),
        ],
    );

    harness.updater().run().await.unwrap();

    let downloads = harness.release().downloads();
    assert_eq!(downloads.len(), 1);
    assert!(downloads[0].ends_with(&format!("/1/{LINUX_ASSET}")));
}

#[tokio::test]
async fn test_download_failure_changes_nothing() {
    let harness = TestHarness::new();
    seed_installation(&harness, "1.4.0").await;
    let files = harness.snapshot();

    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);
    harness.release().fail_downloads();

    let result = harness.updater().run().await;
    assert!(matches!(result, Err(Error::Network(_))), "{result:?}");
    assert_eq!(harness.snapshot(), files);
    assert_eq!(harness.version_file_bytes().unwrap(), b"v1.4.0");
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_stale_attempts_are_swept() {
    let harness = TestHarness::new();
    let stale = harness.paths().scratch_dir.join(".attempt-interrupted");
    std::fs::create_dir_all(stale.join("staging/frp_1.4.0_linux_amd64")).unwrap();
    std::fs::write(stale.join("staging/frp_1.4.0_linux_amd64/frps"), "half").unwrap();

    harness
        .release()
        .publish("v1.5.0", vec![(LINUX_ASSET, release_archive("1.5.0"))]);
    harness.updater().run().await.unwrap();

    assert!(!stale.exists());
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_metadata_failure_is_network_error() {
    let harness = TestHarness::new();

    let result = harness.updater().run().await;
    assert!(matches!(result, Err(Error::Network(_))), "{result:?}");
    assert!(harness.version_file_bytes().is_none());
}
