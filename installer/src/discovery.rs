//! Local manifest discovery for the save pipeline.
//!
//! Walks a directory tree looking for manifest files, and turns each one
//! that names a remote manifest URL into a [`ProfileRecord`]. Problems with
//! individual manifests are collected as [`DiscoverySkip`] entries and never
//! abort the scan.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace, warn};
use std::fs;

use crate::error::{InstallerError, Result};
use crate::manifest::parse_local_manifest;
use crate::profile::ProfileRecord;

/// A manifest or directory the scan could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySkip {
    /// The file or directory that was skipped.
    pub path: Utf8PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// The outcome of a discovery scan.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Records in manifest path order.
    pub records: Vec<ProfileRecord>,
    /// Everything that could not be turned into a record.
    pub skipped: Vec<DiscoverySkip>,
}

/// Scan `root` recursively for files named `manifest_filename`.
///
/// Hidden directories are searched. Symlinked directories are not followed.
///
/// # Errors
///
/// Returns [`InstallerError::ScanRootMissing`] when `root` is not a
/// directory.
pub fn discover_modules(root: &Utf8Path, manifest_filename: &str) -> Result<DiscoveryReport> {
    if !root.is_dir() {
        return Err(InstallerError::ScanRootMissing {
            path: root.to_owned(),
        });
    }

    let mut report = DiscoveryReport::default();
    let mut manifests = Vec::new();
    walk(root, manifest_filename, &mut manifests, &mut report.skipped);
    manifests.sort();
    debug!("found {} candidate manifests under {root}", manifests.len());

    for path in manifests {
        match record_for(&path) {
            Ok(record) => {
                trace!("{path}: {record}");
                report.records.push(record);
            }
            Err(reason) => skip(&mut report.skipped, path, reason),
        }
    }

    Ok(report)
}

fn walk(
    dir: &Utf8Path,
    manifest_filename: &str,
    manifests: &mut Vec<Utf8PathBuf>,
    skipped: &mut Vec<DiscoverySkip>,
) {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(e) => {
            skip(skipped, dir.to_owned(), format!("cannot read directory: {e}"));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skip(skipped, dir.to_owned(), format!("cannot read entry: {e}"));
                continue;
            }
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if file_type.is_dir() {
            walk(path, manifest_filename, manifests, skipped);
        } else if entry.file_name() == manifest_filename && path.is_file() {
            manifests.push(path.to_owned());
        }
    }
}

fn record_for(path: &Utf8Path) -> std::result::Result<ProfileRecord, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read manifest: {e}"))?;
    let manifest = parse_local_manifest(&text).map_err(|e| format!("invalid manifest: {e}"))?;
    let url = manifest
        .manifest_url()
        .ok_or_else(|| "manifest has no manifest URL".to_owned())?;
    Ok(ProfileRecord::new(manifest.display_name(), url))
}

fn skip(skipped: &mut Vec<DiscoverySkip>, path: Utf8PathBuf, reason: String) {
    warn!("skipping {path}: {reason}");
    skipped.push(DiscoverySkip { path, reason });
}
