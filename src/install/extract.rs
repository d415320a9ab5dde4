//! Safe `.tar.gz` extraction.
//!
//! Every entry is checked before it is written: entry paths may not leave
//! the destination, and link entries may not point outside it.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path};
use tar::EntryType;
use tracing::debug;

/// Extract a gzip-compressed tar archive into `dest`.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the archive is corrupt, an entry would land
/// outside `dest`, or an entry cannot be written. Entries already written
/// are left in `dest` for the caller to discard.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| {
        Error::Storage(format!("Failed to open archive '{}': {e}", archive.display()))
    })?;

    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries = tar
        .entries()
        .map_err(|e| Error::Archive(format!("Failed to read tar entries: {e}")))?;

    let mut count = 0;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::Archive(format!("Failed to read tar entry: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| Error::Archive(format!("Failed to read entry path: {e}")))?
            .into_owned();

        if !is_contained(&path) {
            return Err(Error::Archive(format!(
                "Entry '{}' escapes the staging area",
                path.display()
            )));
        }

        if crosses_symlink(dest, &path) {
            return Err(Error::Archive(format!(
                "Entry '{}' is written through a symlink",
                path.display()
            )));
        }

        let kind = entry.header().entry_type();
        if matches!(kind, EntryType::Symlink | EntryType::Link) {
            let target = entry
                .link_name()
                .map_err(|e| Error::Archive(format!("Failed to read link target: {e}")))?
                .ok_or_else(|| {
                    Error::Archive(format!("Link '{}' has no target", path.display()))
                })?;

            // Hard link targets are archive paths; symlinks resolve from their parent.
            let resolved = if kind == EntryType::Link {
                target.into_owned()
            } else {
                path.parent().unwrap_or_else(|| Path::new("")).join(target)
            };

            if !is_contained(&resolved) {
                return Err(Error::Archive(format!(
                    "Link '{}' points outside the staging area",
                    path.display()
                )));
            }

            if kind == EntryType::Link && crosses_symlink(dest, &resolved) {
                return Err(Error::Archive(format!(
                    "Hard link '{}' targets a path through a symlink",
                    path.display()
                )));
            }
        }

        let unpacked = entry.unpack_in(dest).map_err(|e| {
            Error::Archive(format!("Failed to unpack '{}': {e}", path.display()))
        })?;
        if !unpacked {
            return Err(Error::Archive(format!(
                "Entry '{}' escapes the staging area",
                path.display()
            )));
        }

        count += 1;
    }

    debug!("Extracted {} entries into {}", count, dest.display());
    Ok(count)
}

/// True if `path`, taken relative to the destination, stays inside it.
///
/// Absolute paths are rejected outright; `..` is allowed only while it does
/// not climb above the root.
fn is_contained(path: &Path) -> bool {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// True if a directory leading to `path` under `dest` is already a symlink.
///
/// `path` must already be contained, so `..` never pops above `dest`.
fn crosses_symlink(dest: &Path, path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };

    let mut current = dest.to_path_buf();
    for component in parent.components() {
        match component {
            Component::Normal(name) => {
                current.push(name);
                if is_symlink(&current) {
                    return true;
                }
            }
            Component::ParentDir => {
                current.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    false
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Maximum number of links followed while resolving one target.
const MAX_LINK_HOPS: usize = 40;

/// One step of a relative path walk.
enum Step {
    Up,
    Down(OsString),
}

/// Split a link target into steps. `None` for absolute targets.
fn steps(target: &Path) -> Option<Vec<Step>> {
    let mut steps = Vec::new();
    for component in target.components() {
        match component {
            Component::Normal(name) => steps.push(Step::Down(name.to_os_string())),
            Component::ParentDir => steps.push(Step::Up),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(steps)
}

/// Check that every symlink under `root` resolves to a path inside `root`.
///
/// Targets are followed through the links on disk, so a chain such as
/// `a -> .` plus `c -> a/..` is caught even though each link looks contained
/// on its own.
///
/// # Errors
///
/// Returns [`Error::Archive`] for the first link that leaves `root` and
/// [`Error::Storage`] if the tree cannot be read.
pub(crate) fn check_links(root: &Path) -> Result<()> {
    check_dir(root, &mut Vec::new())
}

fn check_dir(root: &Path, rel: &mut Vec<OsString>) -> Result<()> {
    let dir = rel.iter().fold(root.to_path_buf(), |p, n| p.join(n));
    let entries = std::fs::read_dir(&dir)
        .and_then(|d| d.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| Error::Storage(format!("Failed to read '{}': {e}", dir.display())))?;

    for entry in entries {
        let file_type = entry.file_type().map_err(|e| {
            Error::Storage(format!("Failed to inspect '{}': {e}", entry.path().display()))
        })?;

        if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path()).map_err(|e| {
                Error::Storage(format!("Failed to read link '{}': {e}", entry.path().display()))
            })?;
            if !resolves_inside(root, rel.clone(), &target) {
                return Err(Error::Archive(format!(
                    "Link '{}' resolves outside the package",
                    entry.path().display()
                )));
            }
        } else if file_type.is_dir() {
            rel.push(entry.file_name());
            check_dir(root, rel)?;
            rel.pop();
        }
    }
    Ok(())
}

/// Follow `target` from the directory `stack` (relative to `root`).
fn resolves_inside(root: &Path, mut stack: Vec<OsString>, target: &Path) -> bool {
    let Some(initial) = steps(target) else {
        return false;
    };
    let mut pending: VecDeque<Step> = initial.into();
    let mut hops = 0;

    while let Some(step) = pending.pop_front() {
        match step {
            Step::Up => {
                if stack.pop().is_none() {
                    return false;
                }
            }
            Step::Down(name) => {
                stack.push(name);
                let current = stack.iter().fold(root.to_path_buf(), |p, n| p.join(n));
                let Ok(next) = std::fs::read_link(&current) else {
                    continue;
                };

                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return false;
                }
                stack.pop();
                let Some(more) = steps(&next) else {
                    return false;
                };
                for step in more.into_iter().rev() {
                    pending.push_front(step);
                }
            }
        }
    }
    true
}
