//! Shared test utilities for the installer crate.

use crate::artefact::download::{DownloadError, ModuleFetcher};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone)]
enum FixtureEntry {
    File { name: String, contents: Vec<u8> },
    Directory { name: String },
}

/// Builder for zip archives used as module artefacts in tests.
///
/// # Examples
///
/// ```
/// use modsync_installer::test_utils::ZipFixture;
///
/// let temp = tempfile::tempdir().expect("temp dir");
/// let path = temp.path().join("module.zip");
/// ZipFixture::new()
///     .file("demo-1.0/module.json", r#"{"id":"demo"}"#)
///     .write_to(&path);
/// assert!(path.is_file());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

impl ZipFixture {
    /// Creates an empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file entry.
    #[must_use]
    pub fn file(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_owned(),
            contents: contents.as_ref().to_vec(),
        });
        self
    }

    /// Adds an explicit directory entry. Names should end with `/`.
    #[must_use]
    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Directory {
            name: name.to_owned(),
        });
        self
    }

    /// Writes the archive to `path`, replacing any existing file.
    ///
    /// # Panics
    ///
    /// Panics if the archive cannot be written.
    pub fn write_to(&self, path: &Path) {
        let file = File::create(path).expect("create zip fixture");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);

        for entry in &self.entries {
            match entry {
                FixtureEntry::File { name, contents } => {
                    writer
                        .start_file(name.as_str(), options)
                        .expect("start zip entry");
                    writer.write_all(contents).expect("write zip entry");
                }
                FixtureEntry::Directory { name } => {
                    writer
                        .add_directory(name.as_str(), options)
                        .expect("add zip directory");
                }
            }
        }
        writer.finish().expect("finish zip fixture");
    }
}

/// A [`ModuleFetcher`] serving canned responses keyed by URL.
///
/// Unknown URLs answer [`DownloadError::NotFound`]; URLs marked with
/// [`StubFetcher::failing`] answer [`DownloadError::HttpError`]. Every
/// request is recorded in order.
#[derive(Debug, Default)]
pub struct StubFetcher {
    manifests: HashMap<String, String>,
    artefacts: HashMap<String, ZipFixture>,
    failing: HashSet<String>,
    requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Creates a fetcher with no registered URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` at `url` as a manifest document.
    #[must_use]
    pub fn with_manifest(mut self, url: &str, body: &str) -> Self {
        self.manifests.insert(url.to_owned(), body.to_owned());
        self
    }

    /// Serves `archive` at `url` as an artefact.
    #[must_use]
    pub fn with_artefact(mut self, url: &str, archive: ZipFixture) -> Self {
        self.artefacts.insert(url.to_owned(), archive);
        self
    }

    /// Registers a module: a manifest at `manifest_url` naming `id` and a
    /// download at `download_url` serving `archive`.
    #[must_use]
    pub fn with_module(
        self,
        manifest_url: &str,
        id: &str,
        download_url: &str,
        archive: ZipFixture,
    ) -> Self {
        let body = serde_json::json!({ "id": id, "download": download_url }).to_string();
        self.with_manifest(manifest_url, &body)
            .with_artefact(download_url, archive)
    }

    /// Makes every request for `url` fail with a transport error.
    #[must_use]
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_owned());
        self
    }

    /// Returns every requested URL in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Returns how many times `url` was requested.
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    fn record(&self, url: &str) -> Result<(), DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        if self.failing.contains(url) {
            return Err(DownloadError::HttpError {
                url: url.to_owned(),
                reason: "connection reset by stub".to_owned(),
            });
        }
        Ok(())
    }
}

impl ModuleFetcher for StubFetcher {
    fn fetch_manifest(&self, url: &str) -> Result<String, DownloadError> {
        self.record(url)?;
        self.manifests
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }

    fn fetch_artefact(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.record(url)?;
        let archive = self
            .artefacts
            .get(url)
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })?;
        archive.write_to(dest);
        Ok(())
    }
}
