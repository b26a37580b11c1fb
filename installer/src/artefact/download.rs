//! Manifest and artefact retrieval over HTTP.
//!
//! Provides a trait-based abstraction for fetching remote manifests and
//! module archives, enabling dependency injection for testing. The
//! production [`HttpFetcher`] uses `ureq` with separate timeout and retry
//! budgets for manifests (small, quick) and artefacts (large, slow).

use log::{debug, trace};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use super::retry::RetryPolicy;
use crate::config::{FetchSettings, InstallerConfig};

/// Trait for fetching manifests and artefacts.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use modsync_installer::artefact::download::HttpFetcher;
/// use modsync_installer::config::InstallerConfig;
///
/// let fetcher = HttpFetcher::from_config(&InstallerConfig::default());
/// // Use fetcher.fetch_manifest("https://example.test/module.json") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ModuleFetcher {
    /// Fetch the manifest document at `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the retry budget is
    /// spent or the server answers with a non-success status.
    fn fetch_manifest(&self, url: &str) -> Result<String, DownloadError>;

    /// Fetch the artefact at `url` and write it to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the file write fails.
    fn fetch_artefact(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from manifest and artefact retrieval.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The request failed in transit (DNS, connect, timeout, broken body).
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with an unexpected status code.
    #[error("server returned HTTP {status} for {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered, but the body is unusable (not UTF-8, or over
    /// the size limit). Fetching it again would return the same body.
    #[error("unusable response body from {url}: {reason}")]
    Body {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the problem.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Return true when another attempt might succeed.
    ///
    /// Transport failures, request timeouts (408), rate limiting (429), and
    /// server errors (5xx) are transient. Unusable bodies, local I/O errors
    /// and other client errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { .. } => true,
            Self::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::NotFound { .. } | Self::Body { .. } | Self::Io(_) => false,
        }
    }
}

/// HTTP-based fetcher using `ureq`, with bounded retries.
pub struct HttpFetcher {
    manifest_agent: ureq::Agent,
    manifest_retry: RetryPolicy,
    artefact_agent: ureq::Agent,
    artefact_retry: RetryPolicy,
}

impl HttpFetcher {
    /// Build a fetcher from the timeout and retry settings in `config`.
    #[must_use]
    pub fn from_config(config: &InstallerConfig) -> Self {
        Self {
            manifest_agent: http_agent(&config.manifest),
            manifest_retry: config.manifest.retry_policy(),
            artefact_agent: http_agent(&config.artefact),
            artefact_retry: config.artefact.retry_policy(),
        }
    }
}

impl ModuleFetcher for HttpFetcher {
    fn fetch_manifest(&self, url: &str) -> Result<String, DownloadError> {
        self.manifest_retry.run(
            |attempt| {
                trace!("fetching manifest {url} (attempt {attempt})");
                download_text(&self.manifest_agent, url)
            },
            DownloadError::is_transient,
        )
    }

    fn fetch_artefact(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.artefact_retry.run(
            |attempt| {
                trace!("fetching artefact {url} (attempt {attempt})");
                download_to_file(&self.artefact_agent, url, dest)
            },
            DownloadError::is_transient,
        )?;
        debug!("artefact {url} written to {}", dest.display());
        Ok(())
    }
}

/// Download a URL and return the body as a string.
fn download_text(agent: &ureq::Agent, url: &str) -> Result<String, DownloadError> {
    let response = agent.get(url).call().map_err(|e| map_ureq_error(url, &e))?;
    let bytes = response
        .into_body()
        .read_to_vec()
        .map_err(|e| map_body_error(url, e))?;
    String::from_utf8(bytes).map_err(|e| DownloadError::Body {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Download a URL and write the body to a file, truncating any previous
/// attempt's partial content.
fn download_to_file(agent: &ureq::Agent, url: &str, dest: &Path) -> Result<(), DownloadError> {
    let response = agent.get(url).call().map_err(|e| map_ureq_error(url, &e))?;
    let mut reader = response.into_body().into_reader();
    let mut file = File::create(dest)?;
    copy_body(url, &mut reader, &mut file)?;
    file.sync_all()?;
    Ok(())
}

/// Copy a response body into `writer`.
///
/// Read failures are transport errors; write failures are local I/O errors.
fn copy_body(
    url: &str,
    reader: &mut dyn Read,
    writer: &mut dyn Write,
) -> Result<u64, DownloadError> {
    let mut buffer = vec![0_u8; 64 * 1024];
    let mut total = 0_u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(DownloadError::HttpError {
                    url: url.to_owned(),
                    reason: format!("transfer interrupted: {e}"),
                });
            }
        };
        writer.write_all(&buffer[..read])?;
        total = total.saturating_add(read as u64);
    }
}

fn http_agent(settings: &FetchSettings) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => DownloadError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

fn map_body_error(url: &str, err: ureq::Error) -> DownloadError {
    match err {
        ureq::Error::BodyExceedsLimit(limit) => DownloadError::Body {
            url: url.to_owned(),
            reason: format!("body exceeds {limit} bytes"),
        },
        other => map_ureq_error(url, &other),
    }
}
