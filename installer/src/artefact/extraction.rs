//! Archive extraction for downloaded module artefacts.
//!
//! Extracts `.zip` archives into a target directory with path traversal
//! protection to prevent zip-slip attacks. Existing files are overwritten.

use log::trace;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use modsync_installer::artefact::extraction::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::Archive`] if the
    /// archive is corrupt, and [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive is corrupt or not a zip file.
    #[error("unreadable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },
}

/// Default extractor using the `zip` crate.
///
/// Validates every entry path before anything is written, so a hostile
/// archive is rejected without partial output outside the destination.
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            validate_entry_path(entry.name())?;
        }

        let mut written = 0;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let relative = PathBuf::from(entry.name());
            let dest_path = dest_dir.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest_path)?;
                continue;
            }

            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut output = File::create(&dest_path)?;
            io::copy(&mut entry, &mut output)?;
            apply_mode(&dest_path, entry.unix_mode())?;
            trace!("extracted {}", relative.display());
            written += 1;
        }

        Ok(written)
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode.map(|mode| mode & 0o777) {
        Some(0) | None => Ok(()),
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o600)),
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

/// Validate that an archive entry name does not escape the destination
/// directory via `..` components, absolute paths, or drive prefixes.
fn validate_entry_path(name: &str) -> Result<(), ExtractionError> {
    let normalised = name.replace('\\', "/");
    let path = Path::new(&normalised);
    let escapes = normalised.starts_with('/')
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        })
        || normalised.split('/').next().is_some_and(|first| first.contains(':'));

    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: name.to_owned(),
        });
    }
    Ok(())
}
