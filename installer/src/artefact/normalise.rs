//! Post-extraction layout normalisation.
//!
//! Many module archives wrap their contents in a single top-level folder, so
//! after extraction the manifest sits one level too deep:
//!
//! ```text
//! <root>/dice-so-nice/dice-so-nice-4.2/module.json
//! ```
//!
//! [`normalise_layout`] detects exactly that shape and lifts the wrapper's
//! contents up one level. Any other shape is reported as ambiguous and left
//! untouched. File contents are never read, and only one level is unwrapped.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io;

const HOLDING_PREFIX: &str = ".modsync-holding-";

/// What normalisation did to a target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormaliseOutcome {
    /// The manifest was already at the root; nothing was moved.
    AlreadyAtRoot,
    /// A single wrapper directory was lifted into the root.
    Unwrapped {
        /// Name of the wrapper directory that was removed.
        wrapper: String,
    },
}

/// Errors arising from layout normalisation.
#[derive(Debug, thiserror::Error)]
pub enum NormaliseError {
    /// The layout is not the single-wrapper shape; nothing was changed.
    #[error(
        "manifest not found at the root of {path} and the layout is not a single wrapper directory (entries: {})",
        format_entries(entries)
    )]
    Ambiguous {
        /// The target directory.
        path: Utf8PathBuf,
        /// Names of the target's direct entries.
        entries: Vec<String>,
    },

    /// Unwrapping was attempted but did not complete cleanly.
    #[error("could not lift wrapper directory in {path}: {reason}")]
    Adjustment {
        /// The target directory.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
        /// Holding directory left behind with moved content, if any.
        holding: Option<Utf8PathBuf>,
    },
}

fn format_entries(entries: &[String]) -> String {
    if entries.is_empty() {
        "none".to_owned()
    } else {
        entries.join(", ")
    }
}

struct DirEntryInfo {
    name: String,
    is_dir: bool,
}

/// Ensure `manifest_filename` sits directly inside `target`.
///
/// # Errors
///
/// Returns [`NormaliseError::Ambiguous`] when the target does not have the
/// single-wrapper shape, and [`NormaliseError::Adjustment`] when the
/// wrapper could not be lifted or the manifest is still missing afterwards.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use modsync_installer::artefact::normalise::{NormaliseOutcome, normalise_layout};
///
/// let temp = tempfile::tempdir().expect("temp dir");
/// let target = Utf8PathBuf::try_from(temp.path().join("demo")).expect("UTF-8 path");
/// std::fs::create_dir_all(target.join("demo-1.0")).expect("create wrapper");
/// std::fs::write(target.join("demo-1.0/module.json"), "{}").expect("write manifest");
///
/// let outcome = normalise_layout(&target, "module.json").expect("normalise");
/// assert!(matches!(outcome, NormaliseOutcome::Unwrapped { .. }));
/// assert!(target.join("module.json").is_file());
/// ```
pub fn normalise_layout(
    target: &Utf8Path,
    manifest_filename: &str,
) -> Result<NormaliseOutcome, NormaliseError> {
    if target.join(manifest_filename).is_file() {
        return Ok(NormaliseOutcome::AlreadyAtRoot);
    }

    let entries = list_entries(target).map_err(|e| adjustment(target, &e, None))?;

    let wrapper = match entries.as_slice() {
        [only] if only.is_dir && target.join(&only.name).join(manifest_filename).is_file() => {
            only.name.clone()
        }
        _ => {
            return Err(NormaliseError::Ambiguous {
                path: target.to_owned(),
                entries: entries.iter().map(|entry| entry.name.clone()).collect(),
            });
        }
    };

    debug!("lifting wrapper directory {wrapper} in {target}");
    lift_wrapper(target, &wrapper)?;

    if !target.join(manifest_filename).is_file() {
        return Err(NormaliseError::Adjustment {
            path: target.to_owned(),
            reason: format!("{manifest_filename} is still missing after unwrapping"),
            holding: None,
        });
    }

    Ok(NormaliseOutcome::Unwrapped { wrapper })
}

/// List direct entries, hidden ones included. Symlinks are not followed.
fn list_entries(dir: &Utf8Path) -> io::Result<Vec<DirEntryInfo>> {
    let mut entries = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        entries.push(DirEntryInfo {
            name: entry.file_name().to_owned(),
            is_dir: entry.file_type()?.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Move the wrapper's contents into a holding directory beside the target,
/// drop the emptied target, and rename the holding directory into place.
///
/// The lifted directory keeps the permissions the target had.
fn lift_wrapper(target: &Utf8Path, wrapper: &str) -> Result<(), NormaliseError> {
    let parent = target.parent().ok_or_else(|| NormaliseError::Adjustment {
        path: target.to_owned(),
        reason: "target has no parent directory".to_owned(),
        holding: None,
    })?;
    let permissions = fs::metadata(target)
        .map_err(|e| adjustment(target, &e, None))?
        .permissions();
    let mut guard = tempfile::Builder::new()
        .prefix(HOLDING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| adjustment(target, &e, None))?;
    let holding = Utf8PathBuf::try_from(guard.path().to_path_buf())
        .map_err(|e| adjustment(target, &e.into_io_error(), None))?;
    let wrapper_path = target.join(wrapper);

    if let Err((moved, err)) = move_children(&wrapper_path, &holding) {
        if move_back(&moved, &holding, &wrapper_path) {
            return Err(adjustment(target, &err, None));
        }
        guard.disable_cleanup(true);
        return Err(adjustment(target, &err, Some(holding)));
    }
    guard.disable_cleanup(true);
    debug!("moved wrapper contents into {holding}");

    fs::set_permissions(&holding, permissions)
        .and_then(|()| fs::remove_dir(&wrapper_path))
        .and_then(|()| fs::remove_dir(target))
        .and_then(|()| fs::rename(&holding, target))
        .map_err(|e| adjustment(target, &e, Some(holding.clone())))
}

/// Move every direct child of `from` into `to`.
///
/// On failure, returns the names already moved alongside the error.
fn move_children(from: &Utf8Path, to: &Utf8Path) -> Result<(), (Vec<String>, io::Error)> {
    let mut moved = Vec::new();
    let children = from.read_dir_utf8().map_err(|e| (Vec::new(), e))?;
    for child in children {
        let name = match child {
            Ok(child) => child.file_name().to_owned(),
            Err(e) => return Err((moved, e)),
        };
        if let Err(e) = fs::rename(from.join(&name), to.join(&name)) {
            return Err((moved, e));
        }
        moved.push(name);
    }
    Ok(())
}

/// Best-effort rollback of a partial move. Returns true when every entry
/// went back.
fn move_back(names: &[String], holding: &Utf8Path, wrapper: &Utf8Path) -> bool {
    let mut restored = true;
    for name in names {
        if let Err(e) = fs::rename(holding.join(name), wrapper.join(name)) {
            warn!("could not restore {name} from {holding}: {e}");
            restored = false;
        }
    }
    restored
}

fn adjustment(
    target: &Utf8Path,
    err: &io::Error,
    holding: Option<Utf8PathBuf>,
) -> NormaliseError {
    NormaliseError::Adjustment {
        path: target.to_owned(),
        reason: err.to_string(),
        holding,
    }
}

#[cfg(test)]
#[path = "normalise_tests.rs"]
mod tests;
