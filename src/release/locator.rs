//! Selects the platform archive among a release's assets.

use crate::error::{Error, Result};
use crate::release::Asset;
use crate::version::parse_version;
use regex::Regex;
use semver::Version;
use tracing::{debug, warn};

/// An asset whose name matched the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMatch {
    /// Matched asset name.
    pub name: String,
    /// Download URL of the matched asset.
    pub download_url: String,
    /// Version captured from the name, if the capture parsed.
    pub version: Option<Version>,
}

/// Matches asset names against `<product>_<version>_<os>_<arch>.tar.gz`.
///
/// Matching is case-sensitive and anchored at the start of the name. The
/// first asset in manifest order wins.
#[derive(Debug, Clone)]
pub struct ReleaseLocator {
    pattern: Regex,
}

impl ReleaseLocator {
    /// Build a locator from a regular expression.
    ///
    /// The first capture group, if any, is read as the asset's version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the expression does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^(?:{pattern})"))
            .map_err(|e| Error::Config(format!("Invalid asset pattern '{pattern}': {e}")))?;
        Ok(Self { pattern })
    }

    /// Build the standard pattern for a product on a platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the resulting expression does not compile.
    pub fn for_platform(product: &str, os: &str, arch: &str) -> Result<Self> {
        Self::new(&format!(
            r"{}_(\d+\.\d+\.\d+)_{}_{}\.tar\.gz",
            regex::escape(product),
            regex::escape(os),
            regex::escape(arch)
        ))
    }

    /// The anchored expression in use.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Find the first asset whose name matches.
    ///
    /// Returns `None` when nothing matches. That is not an error here; the
    /// caller decides how to report it.
    #[must_use]
    pub fn find_asset(&self, assets: &[Asset]) -> Option<AssetMatch> {
        assets.iter().find_map(|asset| {
            let captures = self.pattern.captures(&asset.name)?;
            debug!("Asset {} matches {}", asset.name, self.pattern);

            let version = captures.get(1).and_then(|m| match parse_version(m.as_str()) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Ignoring version captured from {}: {}", asset.name, e);
                    None
                }
            });

            Some(AssetMatch {
                name: asset.name.clone(),
                download_url: asset.download_url.clone(),
                version,
            })
        })
    }
}
