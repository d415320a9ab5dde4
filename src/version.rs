//! Release tag parsing and ordering.
//!
//! Release hosts tag versions as `v1.2.3` while asset names embed `1.2.3`.
//! Both go through [`parse_version`] so that a stored tag, a remote tag and a
//! version captured from an asset name always compare the same way.

use crate::error::{Error, Result};
use semver::Version;
use std::cmp::Ordering;

/// Parse a version string, tolerating one leading non-numeric tag character.
///
/// # Errors
///
/// Returns [`Error::Version`] if the remainder is not a semantic version.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let numeric = match trimmed.chars().next() {
        Some(c) if !c.is_ascii_digit() => &trimmed[c.len_utf8()..],
        _ => trimmed,
    };

    Version::parse(numeric).map_err(|e| Error::Version(format!("Invalid version '{raw}': {e}")))
}

/// Compare two version strings.
///
/// Returns how `a` orders relative to `b`.
///
/// # Errors
///
/// Returns [`Error::Version`] if either side does not parse.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}
