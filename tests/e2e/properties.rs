//! Update decision properties over arbitrary version pairs.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{ArchiveBuilder, TestHarness};
use proptest::prelude::*;
use release_sync::UpdateOutcome;
use std::cmp::Ordering;

fn version() -> impl Strategy<Value = (u64, u64, u64)> {
    (0u64..4, 0u64..4, 0u64..12)
}

fn run_once(harness: &TestHarness) -> UpdateOutcome {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(harness.updater().run())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A run installs iff nothing is recorded or the release is strictly newer.
    #[test]
    fn updates_iff_release_is_newer(local in proptest::option::of(version()), remote in version()) {
        let harness = TestHarness::new();
        let remote_text = format!("{}.{}.{}", remote.0, remote.1, remote.2);
        let asset = format!("frp_{remote_text}_linux_amd64.tar.gz");
        let archive = ArchiveBuilder::new(&format!("frp_{remote_text}_linux_amd64"))
            .file("frps", &remote_text)
            .build();
        harness.release().publish(&format!("v{remote_text}"), vec![(asset.as_str(), archive)]);

        if let Some((major, minor, patch)) = local {
            harness.store().write(&format!("v{major}.{minor}.{patch}")).unwrap();
        }
        let before = harness.version_file_bytes();

        let outcome = run_once(&harness);

        let should_update = local.map_or(true, |l| remote.cmp(&l) == Ordering::Greater);
        prop_assert_eq!(outcome.is_updated(), should_update);
        prop_assert_eq!(harness.release().downloads().len(), usize::from(should_update));
        if should_update {
            prop_assert_eq!(
                harness.version_file_bytes(),
                Some(format!("v{remote_text}").into_bytes())
            );
        } else {
            prop_assert_eq!(harness.version_file_bytes(), before);
            prop_assert!(harness.snapshot().is_empty());
        }
        prop_assert_eq!(harness.scratch_entries(), 0);
    }
}
