//! Transfer stage: idempotency check and artefact acquisition.
//!
//! A module counts as installed when its target directory holds the
//! manifest file at its root. Installed modules are skipped without any
//! network traffic. Otherwise the artefact is downloaded into the target
//! directory, or reused when a previous run left one behind.
//!
//! Downloads land in a `.part` file that is renamed into place only once
//! complete, so an interrupted run never leaves a truncated archive at the
//! path that later runs reuse.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;

use crate::artefact::download::{DownloadError, ModuleFetcher};
use crate::error::RecordError;
use crate::identifier::ModuleIdentifier;
use crate::resolution::ResolvedModule;

/// Filename of the downloaded archive inside a module's target directory.
pub const ARTEFACT_FILENAME: &str = ".modsync-download.zip";

/// Filename an archive is written to while its download is in progress.
pub const PARTIAL_ARTEFACT_FILENAME: &str = ".modsync-download.zip.part";

/// Return true when `target` already holds an installed module.
///
/// The check is evaluated against the filesystem on every call.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use modsync_installer::transfer::is_installed;
///
/// assert!(!is_installed(Utf8Path::new("/nonexistent/module"), "module.json"));
/// ```
#[must_use]
pub fn is_installed(target: &Utf8Path, manifest_filename: &str) -> bool {
    target.is_dir() && target.join(manifest_filename).is_file()
}

/// Path of the install directory for `identifier` under `install_root`.
#[must_use]
pub fn target_path(install_root: &Utf8Path, identifier: &ModuleIdentifier) -> Utf8PathBuf {
    install_root.join(identifier.as_str())
}

/// Path of the downloaded archive inside `target`.
#[must_use]
pub fn artefact_path(target: &Utf8Path) -> Utf8PathBuf {
    target.join(ARTEFACT_FILENAME)
}

/// Path of the in-progress download inside `target`.
#[must_use]
pub fn partial_artefact_path(target: &Utf8Path) -> Utf8PathBuf {
    target.join(PARTIAL_ARTEFACT_FILENAME)
}

/// Result of the transfer stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The module was already installed; nothing was fetched.
    AlreadyInstalled {
        /// The module's target directory.
        target: Utf8PathBuf,
    },
    /// The artefact is on disk and ready to extract.
    Ready {
        /// The module's target directory.
        target: Utf8PathBuf,
        /// Path to the downloaded archive.
        artefact: Utf8PathBuf,
        /// True when the archive was left over from an earlier run.
        reused: bool,
    },
}

/// Ensure the artefact for `module` is present under `install_root`.
///
/// # Errors
///
/// Returns [`RecordError::ArtefactDownload`] when the target directory
/// cannot be created or the download fails. A failed download removes the
/// partial artefact and, when it is left empty, the target directory.
pub fn transfer(
    module: &ResolvedModule,
    install_root: &Utf8Path,
    manifest_filename: &str,
    fetcher: &dyn ModuleFetcher,
) -> Result<TransferOutcome, RecordError> {
    let target = target_path(install_root, &module.identifier);
    if is_installed(&target, manifest_filename) {
        debug!("{target} already holds {manifest_filename}; skipping transfer");
        return Ok(TransferOutcome::AlreadyInstalled { target });
    }

    fs::create_dir_all(&target).map_err(|e| RecordError::ArtefactDownload {
        url: module.download_url.clone(),
        source: e.into(),
    })?;

    let artefact = artefact_path(&target);
    if artefact.is_file() {
        debug!("reusing artefact left at {artefact}");
        return Ok(TransferOutcome::Ready {
            target,
            artefact,
            reused: true,
        });
    }

    let partial = partial_artefact_path(&target);
    let fetched = fetcher
        .fetch_artefact(&module.download_url, partial.as_std_path())
        .and_then(|()| fs::rename(&partial, &artefact).map_err(DownloadError::from));
    if let Err(source) = fetched {
        discard_partial(&target, &[partial.as_path(), artefact.as_path()]);
        return Err(RecordError::ArtefactDownload {
            url: module.download_url.clone(),
            source,
        });
    }

    Ok(TransferOutcome::Ready {
        target,
        artefact,
        reused: false,
    })
}

/// Remove partial download files, then the target directory if nothing
/// else is in it. Pre-existing content is never touched.
fn discard_partial(target: &Utf8Path, files: &[&Utf8Path]) {
    for file in files.iter().filter(|file| file.exists()) {
        if let Err(e) = fs::remove_file(file) {
            warn!("could not remove partial artefact {file}: {e}");
        }
    }

    let is_empty = fs::read_dir(target).is_ok_and(|mut entries| entries.next().is_none());
    if is_empty {
        if let Err(e) = fs::remove_dir(target) {
            warn!("could not remove empty directory {target}: {e}");
        }
    }
}
