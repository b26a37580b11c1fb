//! Error types for the modsync installer.
//!
//! Two layers of failure exist. [`InstallerError`] is run-scoped and fatal:
//! it stops the process before any module is touched (bad arguments, an
//! unusable install root, an unreadable profile). [`RecordError`] is
//! record-scoped and never fatal: the pipeline reports it against one
//! profile entry and moves on to the next.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::normalise::NormaliseError;
use crate::config::ConfigError;
use crate::identifier::ModuleIdentifier;
use crate::manifest::ManifestParseError;

/// Errors that abort a run before or outside per-record processing.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The installation root cannot be used.
    #[error("install root {path} is not usable: {reason}")]
    InstallRootUnavailable {
        /// Path to the installation root.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The profile file could not be read.
    #[error("failed to read profile {path}")]
    ProfileRead {
        /// Path to the profile file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The profile file could not be written.
    #[error("failed to write profile {path}")]
    ProfileWrite {
        /// Path to the profile file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The discovery root does not exist or is not a directory.
    #[error("scan root {path} is not a directory")]
    ScanRootMissing {
        /// Path that was requested as the scan root.
        path: Utf8PathBuf,
    },

    /// A path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Why a single profile record could not be installed.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The remote manifest could not be fetched, or came back empty.
    #[error("could not fetch manifest {url}: {reason}")]
    ManifestFetch {
        /// The manifest URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The remote manifest is not valid or carries no identifier.
    #[error("could not parse manifest {url}")]
    ManifestParse {
        /// The manifest URL.
        url: String,
        /// The parse failure.
        #[source]
        source: ManifestParseError,
    },

    /// The manifest identifier has no characters usable in a directory name.
    #[error("identifier {raw:?} contains no characters from [A-Za-z0-9_-]")]
    IdentifierInvalid {
        /// The identifier as found in the manifest.
        raw: String,
    },

    /// The manifest has no usable download location.
    #[error("manifest for {identifier} has no download URL")]
    DownloadUrlMissing {
        /// The sanitised module identifier.
        identifier: ModuleIdentifier,
    },

    /// The artefact could not be downloaded.
    #[error("could not download artefact {url}")]
    ArtefactDownload {
        /// The artefact URL.
        url: String,
        /// The download failure.
        #[source]
        source: DownloadError,
    },

    /// The artefact could not be unpacked.
    #[error("could not extract {path}")]
    Extraction {
        /// Path to the artefact on disk.
        path: Utf8PathBuf,
        /// The extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// A wrapper directory was found but lifting it did not finish cleanly.
    #[error("could not adjust layout of {path}: {reason}")]
    StructureAdjustment {
        /// The module directory.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
        /// Holding directory left behind with moved content, if any.
        holding: Option<Utf8PathBuf>,
    },

    /// The unpacked layout has no manifest at its root and is not a single
    /// wrapper directory; nothing was changed.
    #[error(
        "manifest not at the root of {path} and layout is ambiguous (entries: {})",
        entries.join(", ")
    )]
    StructureAmbiguous {
        /// The module directory.
        path: Utf8PathBuf,
        /// Names of the directory's direct entries.
        entries: Vec<String>,
    },
}

impl RecordError {
    /// Short, stable name of the failure class for summaries and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManifestFetch { .. } => "manifest fetch",
            Self::ManifestParse { .. } => "manifest parse",
            Self::IdentifierInvalid { .. } => "invalid identifier",
            Self::DownloadUrlMissing { .. } => "missing download URL",
            Self::ArtefactDownload { .. } => "artefact download",
            Self::Extraction { .. } => "extraction",
            Self::StructureAdjustment { .. } => "structure adjustment",
            Self::StructureAmbiguous { .. } => "ambiguous structure",
        }
    }

    /// A hint for manual follow-up, when one applies.
    #[must_use]
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            Self::Extraction { path, .. } => Some(format!(
                "delete {path} to force a fresh download on the next run"
            )),
            Self::StructureAdjustment {
                holding: Some(holding),
                ..
            } => Some(format!("moved files remain in {holding}")),
            Self::StructureAmbiguous { path, .. } => Some(format!(
                "move the module's files so the manifest sits directly in {path}"
            )),
            _ => None,
        }
    }
}

impl From<NormaliseError> for RecordError {
    fn from(err: NormaliseError) -> Self {
        match err {
            NormaliseError::Ambiguous { path, entries } => Self::StructureAmbiguous { path, entries },
            NormaliseError::Adjustment {
                path,
                reason,
                holding,
            } => Self::StructureAdjustment {
                path,
                reason,
                holding,
            },
        }
    }
}

/// Render an error and its chain of sources on one line.
///
/// # Examples
///
/// ```
/// use modsync_installer::error::display_chain;
///
/// let err = std::io::Error::other("disk full");
/// assert_eq!(display_chain(&err), "disk full");
/// ```
#[must_use]
pub fn display_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
