//! Settings resolution: flags and environment first, then the config file,
//! then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use hateoas::ClientConfig;
use serde::Deserialize;

pub const DEFAULT_DEVICESERVER_URL: &str = "https://deviceserver.creatordev.io";
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.ds-cli";

/// Optional `~/.config/ds-cli/config.toml`.
///
/// ```toml
/// deviceserver_url = "https://deviceserver.example.com"
/// credentials = "~/.ds-cli-staging"
/// timeout_secs = 30
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub deviceserver_url: Option<String>,
    pub credentials: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ds-cli").join("config.toml"))
    }

    /// Loads the file at `path`; a missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub deviceserver_url: String,
    pub credentials: PathBuf,
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Merges command line values (which already include the environment) over `file`.
    pub fn resolve(
        deviceserver_url: Option<String>,
        credentials: Option<String>,
        file: FileConfig,
    ) -> Self {
        let deviceserver_url = deviceserver_url
            .or(file.deviceserver_url)
            .unwrap_or_else(|| DEFAULT_DEVICESERVER_URL.to_string());
        let credentials = credentials
            .or(file.credentials)
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string());

        Self {
            deviceserver_url,
            credentials: expand_home(&credentials),
            timeout: file.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Configuration for the hypermedia client.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.deviceserver_url)
            .with_user_agent(concat!("ds-cli/", env!("CARGO_PKG_VERSION")));
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_flags_win_over_file() {
        let file = FileConfig {
            deviceserver_url: Some("http://file".to_string()),
            credentials: Some("/tmp/file-creds".to_string()),
            timeout_secs: Some(5),
        };

        let settings = Settings::resolve(
            Some("http://flag".to_string()),
            Some("/tmp/flag-creds".to_string()),
            file,
        );

        assert_eq!(settings.deviceserver_url, "http://flag");
        assert_eq!(settings.credentials, PathBuf::from("/tmp/flag-creds"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_file_wins_over_defaults() {
        let file: FileConfig =
            toml::from_str(r#"deviceserver_url = "http://staging""#).unwrap();
        let settings = Settings::resolve(None, None, file);

        assert_eq!(settings.deviceserver_url, "http://staging");
        assert_eq!(settings.credentials, expand_home(DEFAULT_CREDENTIALS_FILE));
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None, FileConfig::default());
        assert_eq!(settings.deviceserver_url, DEFAULT_DEVICESERVER_URL);
        assert!(settings.client_config().entry_url().unwrap().is_some());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("colour = true").is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ds-cli"), home.join(".ds-cli"));
        }
    }
}
