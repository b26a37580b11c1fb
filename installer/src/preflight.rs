//! Checks that must pass before any module is touched.

use camino::Utf8Path;
use log::{debug, warn};
use std::fs;

use crate::error::{InstallerError, Result};

const PROBE_FILENAME: &str = ".modsync-write-probe";

/// Ensure the install root exists and is writable.
///
/// The directory is created when missing. Writability is verified by
/// creating and removing a probe file.
///
/// # Errors
///
/// Returns [`InstallerError::InstallRootUnavailable`] if the path exists
/// but is not a directory, cannot be created, or is not writable.
pub fn check_install_root(install_root: &Utf8Path) -> Result<()> {
    let unavailable = |reason: String| InstallerError::InstallRootUnavailable {
        path: install_root.to_owned(),
        reason,
    };

    if install_root.exists() && !install_root.is_dir() {
        return Err(unavailable("exists but is not a directory".to_owned()));
    }
    fs::create_dir_all(install_root).map_err(|e| unavailable(e.to_string()))?;

    let probe = install_root.join(PROBE_FILENAME);
    match fs::write(&probe, b"probe") {
        Ok(()) => {
            if let Err(e) = fs::remove_file(&probe) {
                warn!("could not remove write probe {probe}: {e}");
            }
            debug!("install root {install_root} is writable");
            Ok(())
        }
        Err(e) => Err(unavailable(format!("not writable: {e}"))),
    }
}
