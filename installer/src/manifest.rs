//! Module manifest documents.
//!
//! Two views of the same `module.json` schema are modelled here:
//!
//! - [`RemoteManifest`] is what the installer fetches from a profile's
//!   manifest URL. Its identifier prefers `id` and falls back to `name`.
//! - [`LocalManifest`] is what discovery reads from disk. Its display name
//!   prefers `title`, then `name`, then `id`, then a literal default.
//!
//! The two fallback orders differ and are kept as separate rules.
//! Only a top-level JSON object is a manifest. Fields holding anything
//! other than a JSON string are treated as absent, and unknown fields are
//! ignored.

use serde_json::{Map, Value};

/// Default manifest filename expected at the root of every module.
pub const MANIFEST_FILENAME: &str = "module.json";

/// Display name used by discovery when a manifest names nothing at all.
pub const UNKNOWN_MODULE_NAME: &str = "Unknown Module";

/// Errors arising from manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// The document is not valid JSON.
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid JSON but its top level is not an object.
    #[error("manifest is not a JSON object (found {found})")]
    NotAnObject {
        /// The JSON type found at the top level.
        found: &'static str,
    },

    /// Neither an `id` nor a `name` field is present.
    #[error("manifest has neither an \"id\" nor a \"name\" field")]
    MissingIdentifier,
}

/// The string-valued fields of a manifest object.
#[derive(Debug, Default)]
struct RawManifest {
    id: Option<String>,
    name: Option<String>,
    title: Option<String>,
    manifest: Option<String>,
    download: Option<String>,
}

impl RawManifest {
    fn parse(json: &str) -> Result<Self, ManifestParseError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            other => Err(ManifestParseError::NotAnObject {
                found: json_type(&other),
            }),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            id: text("id"),
            name: text("name"),
            title: text("title"),
            manifest: text("manifest"),
            download: text("download"),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A manifest fetched from a remote manifest URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteManifest {
    identifier: String,
    download: Option<String>,
}

impl RemoteManifest {
    /// The raw, unsanitised identifier (`id`, else `name`).
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The download location, if present and not blank.
    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        self.download
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Parse a remote manifest document.
///
/// # Errors
///
/// Returns [`ManifestParseError::Json`] when the text is not JSON,
/// [`ManifestParseError::NotAnObject`] when its top level is not an object,
/// and [`ManifestParseError::MissingIdentifier`] when it carries neither an
/// `id` nor a `name`.
///
/// # Examples
///
/// ```
/// use modsync_installer::manifest::parse_remote_manifest;
///
/// let json = r#"{"name":"legacy","id":"modern","download":"https://example.test/m.zip"}"#;
/// let manifest = parse_remote_manifest(json).expect("valid manifest");
/// assert_eq!(manifest.identifier(), "modern");
/// assert_eq!(manifest.download_url(), Some("https://example.test/m.zip"));
/// ```
pub fn parse_remote_manifest(json: &str) -> Result<RemoteManifest, ManifestParseError> {
    let raw = RawManifest::parse(json)?;
    let identifier = raw
        .id
        .or(raw.name)
        .ok_or(ManifestParseError::MissingIdentifier)?;
    Ok(RemoteManifest {
        identifier,
        download: raw.download,
    })
}

/// A manifest found on local disk during discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalManifest {
    title: Option<String>,
    name: Option<String>,
    id: Option<String>,
    manifest: Option<String>,
}

impl LocalManifest {
    /// Human-facing name: `title`, else `name`, else `id`, else
    /// [`UNKNOWN_MODULE_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.id.as_deref())
            .unwrap_or(UNKNOWN_MODULE_NAME)
    }

    /// The remote manifest URL, if present and not blank.
    #[must_use]
    pub fn manifest_url(&self) -> Option<&str> {
        self.manifest
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Parse a manifest read from local disk.
///
/// # Errors
///
/// Returns [`ManifestParseError::Json`] when the text is not JSON and
/// [`ManifestParseError::NotAnObject`] when its top level is not an object.
pub fn parse_local_manifest(json: &str) -> Result<LocalManifest, ManifestParseError> {
    let raw = RawManifest::parse(json)?;
    Ok(LocalManifest {
        title: raw.title,
        name: raw.name,
        id: raw.id,
        manifest: raw.manifest,
    })
}
