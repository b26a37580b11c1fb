//! Installer configuration loaded from TOML.
//!
//! `InstallerConfig` captures the tunables for network retrieval and the
//! manifest filename that marks a module root. Values are deserialised from
//! `config.toml` when present and fall back to sensible defaults otherwise.
//! The file is looked up at `--config` when given, else in the platform
//! configuration directory (for example `~/.config/modsync/config.toml`).

use camino::{Utf8Path, Utf8PathBuf};
use directories_next::ProjectDirs;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use crate::artefact::retry::RetryPolicy;
use crate::manifest::MANIFEST_FILENAME;

const CONFIG_FILENAME: &str = "config.toml";

/// Errors arising from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration file {path}: {reason}")]
    Invalid {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },
}

/// Top-level installer configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Filename that marks the root of an installed module.
    pub manifest_filename: String,
    /// Timeout and retry budget for manifest fetches.
    pub manifest: FetchSettings,
    /// Timeout and retry budget for artefact downloads.
    pub artefact: FetchSettings,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            manifest_filename: MANIFEST_FILENAME.to_owned(),
            manifest: FetchSettings::manifest_defaults(),
            artefact: FetchSettings::artefact_defaults(),
        }
    }
}

/// Timeout and retry settings for one kind of request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FetchSettings {
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    /// Total number of attempts, including the first.
    pub attempts: u32,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "FetchSettings::default_backoff_millis")]
    pub backoff_millis: u64,
}

impl FetchSettings {
    const fn default_backoff_millis() -> u64 {
        1_000
    }

    const fn manifest_defaults() -> Self {
        Self {
            timeout_secs: 30,
            attempts: 3,
            backoff_millis: Self::default_backoff_millis(),
        }
    }

    const fn artefact_defaults() -> Self {
        Self {
            timeout_secs: 300,
            attempts: 5,
            backoff_millis: Self::default_backoff_millis(),
        }
    }

    /// The retry policy described by these settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.backoff_millis))
    }
}

impl InstallerConfig {
    /// Load configuration from `explicit` when given, otherwise from the
    /// platform configuration directory, otherwise defaults.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file exists but cannot be read or
    /// parsed, or when an explicit path does not exist.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load_from(&path),
                _ => {
                    debug!("no configuration file found; using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load_from(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|reason| ConfigError::Invalid {
            path: path.to_owned(),
            reason,
        })?;
        debug!("loaded configuration from {path}");
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let name = self.manifest_filename.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(format!(
                "manifest_filename must be a plain file name, got {name:?}"
            ));
        }
        Ok(())
    }
}

/// The default configuration file location, if the platform provides one.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "", "modsync")?;
    let path = dirs.config_dir().join(CONFIG_FILENAME);
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_documented_budgets() {
        let config = InstallerConfig::default();

        assert_eq!(config.manifest_filename, "module.json");
        assert_eq!(config.manifest.timeout_secs, 30);
        assert_eq!(config.manifest.attempts, 3);
        assert_eq!(config.artefact.timeout_secs, 300);
        assert_eq!(config.artefact.attempts, 5);
        assert!(config.artefact.timeout_secs > config.manifest.timeout_secs);
        assert!(config.artefact.attempts > config.manifest.attempts);
    }

    #[rstest]
    fn deserialises_overrides_from_toml() {
        let source = concat!(
            "manifest_filename = \"system.json\"\n",
            "[artefact]\n",
            "timeout_secs = 60\n",
            "attempts = 2\n",
        );

        let config = InstallerConfig::parse(source).expect("configuration should parse");

        assert_eq!(config.manifest_filename, "system.json");
        assert_eq!(config.artefact.timeout_secs, 60);
        assert_eq!(config.artefact.attempts, 2);
        assert_eq!(config.artefact.backoff_millis, 1_000);
        assert_eq!(config.manifest, FetchSettings::manifest_defaults());
    }

    #[rstest]
    #[case::unknown_top_level("unexpected = true\n")]
    #[case::unknown_nested("[manifest]\ntimeout_secs = 1\nattempts = 1\nspeed = 3\n")]
    #[case::wrong_type("[manifest]\ntimeout_secs = \"soon\"\nattempts = 1\n")]
    #[case::path_in_filename("manifest_filename = \"../module.json\"\n")]
    #[case::empty_filename("manifest_filename = \"\"\n")]
    fn rejects_invalid_configuration(#[case] source: &str) {
        assert!(InstallerConfig::parse(source).is_err(), "expected rejection of {source:?}");
    }

    #[test]
    fn retry_policy_reflects_settings() {
        let settings = FetchSettings {
            timeout_secs: 5,
            attempts: 4,
            backoff_millis: 250,
        };
        let policy = settings.retry_policy();
        assert_eq!(policy.attempts(), 4);
        assert_eq!(policy.backoff(), Duration::from_millis(250));
    }

    #[test]
    fn load_from_reports_missing_explicit_file() {
        let err = InstallerConfig::load(Some(Utf8Path::new("/nonexistent/modsync.toml")))
            .expect_err("missing explicit file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file_from_config_home() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config_dir = temp.path().join("modsync");
        std::fs::create_dir_all(&config_dir).expect("create config dir");
        std::fs::write(
            config_dir.join(CONFIG_FILENAME),
            "[manifest]\ntimeout_secs = 7\nattempts = 1\n",
        )
        .expect("write config");

        let config = temp_env::with_var("XDG_CONFIG_HOME", Some(temp.path()), || {
            InstallerConfig::load(None)
        });

        if cfg!(target_os = "linux") {
            let config = config.expect("configuration should load");
            assert_eq!(config.manifest.timeout_secs, 7);
        }
    }

    #[test]
    fn load_falls_back_to_defaults_without_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = temp_env::with_var("XDG_CONFIG_HOME", Some(temp.path()), || {
            InstallerConfig::load(None)
        })
        .expect("defaults should load");
        assert_eq!(config, InstallerConfig::default());
    }
}
