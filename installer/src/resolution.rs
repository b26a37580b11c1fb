//! Resolution of profile records into installable modules.
//!
//! Resolution fetches a record's remote manifest, derives a sanitised
//! [`ModuleIdentifier`], and extracts the artefact download URL. It has no
//! side effects beyond the network request: the fetched document lives only
//! for the duration of [`resolve_record`] and is dropped on every exit path.

use log::debug;

use crate::artefact::download::ModuleFetcher;
use crate::error::RecordError;
use crate::identifier::ModuleIdentifier;
use crate::manifest::parse_remote_manifest;
use crate::profile::ProfileRecord;

/// A record whose remote manifest has been fetched and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// The sanitised identifier used as the install directory name.
    pub identifier: ModuleIdentifier,
    /// Where the module archive can be downloaded.
    pub download_url: String,
}

/// Resolve a profile record through its remote manifest.
///
/// # Errors
///
/// Returns, in pipeline order:
/// - [`RecordError::ManifestFetch`] when the manifest cannot be fetched or
///   the body is empty,
/// - [`RecordError::ManifestParse`] when it is not a JSON object or has
///   neither `id` nor `name`,
/// - [`RecordError::IdentifierInvalid`] when the identifier sanitises to
///   nothing,
/// - [`RecordError::DownloadUrlMissing`] when `download` is absent or blank.
pub fn resolve_record(
    record: &ProfileRecord,
    fetcher: &dyn ModuleFetcher,
) -> Result<ResolvedModule, RecordError> {
    let url = record.manifest_url();
    let document = fetcher
        .fetch_manifest(url)
        .map_err(|e| RecordError::ManifestFetch {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

    if document.trim().is_empty() {
        return Err(RecordError::ManifestFetch {
            url: url.to_owned(),
            reason: "response body is empty".to_owned(),
        });
    }

    let manifest =
        parse_remote_manifest(&document).map_err(|source| RecordError::ManifestParse {
            url: url.to_owned(),
            source,
        })?;

    let identifier = ModuleIdentifier::sanitise(manifest.identifier()).ok_or_else(|| {
        RecordError::IdentifierInvalid {
            raw: manifest.identifier().to_owned(),
        }
    })?;

    let download_url = manifest
        .download_url()
        .ok_or_else(|| RecordError::DownloadUrlMissing {
            identifier: identifier.clone(),
        })?
        .to_owned();

    debug!("resolved {} to {identifier} ({download_url})", record.display_name());
    Ok(ResolvedModule {
        identifier,
        download_url,
    })
}
