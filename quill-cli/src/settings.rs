//! Resolved CLI settings.
//!
//! Precedence, lowest first: built-in defaults, the YAML config file, then
//! environment variables and flags (clap merges those two).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use quill_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use quill_sync::{SyncConfig, DEFAULT_QUIET_PERIOD};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "quill.yml";

/// Contents of `quill.yml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub quiet_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl FileSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub quiet_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub quiet_period: Duration,
    pub request_timeout: Duration,
    /// Config file that contributed, if any.
    pub source: Option<PathBuf>,
}

impl Settings {
    /// An explicit `config` path must exist; the default one may be absent.
    pub fn resolve(config: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let (file, source) = match config {
            Some(path) => (FileSettings::from_file(path)?, Some(path.to_path_buf())),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    (FileSettings::from_file(&path)?, Some(path))
                } else {
                    (FileSettings::default(), None)
                }
            }
        };
        Ok(Self::merge(file, overrides, source))
    }

    fn merge(file: FileSettings, overrides: Overrides, source: Option<PathBuf>) -> Self {
        let quiet_period = overrides
            .quiet_ms
            .or(file.quiet_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUIET_PERIOD);
        let request_timeout = file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            api_url: overrides
                .api_url
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: overrides.token.or(file.token).filter(|t| !t.is_empty()),
            quiet_period,
            request_timeout,
            source,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone())
            .with_token(self.token.clone())
            .with_request_timeout(self.request_timeout)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::with_quiet_period(self.quiet_period)
    }

    /// Printable view with the token hidden.
    pub fn redacted(&self) -> SettingsView {
        SettingsView {
            api_url: self.api_url.clone(),
            token: self.token.as_ref().map(|_| "********".to_string()),
            quiet_ms: self.quiet_period.as_millis() as u64,
            request_timeout_secs: self.request_timeout.as_secs(),
            config_file: self.source.as_ref().map(|p| p.display().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub api_url: String,
    pub token: Option<String>,
    pub quiet_ms: u64,
    pub request_timeout_secs: u64,
    pub config_file: Option<String>,
}
