//! Application configuration module
//!
//! Endpoints, storage location and timing knobs. Values come from the
//! builder, an optional TOML file, or both (builder values win).
//!
//! ```toml
//! bundle_url = "https://forms.example.org/api/forms"
//! submit_url = "https://forms.example.org/api/forms/submit"
//! app_name = "forms-app"
//! sync_interval_secs = 60
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_APP_NAME: &str = "forms-app";
pub const DEFAULT_PROBE_URL: &str = "https://clients3.google.com/generate_204";
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint returning the form bundle
    pub bundle_url: Option<String>,
    /// Endpoint receiving submissions
    pub submit_url: Option<String>,
    /// Endpoint used by the connectivity probe
    pub probe_url: String,
    /// Name of the per-installation config/data directory
    pub app_name: String,
    /// Overrides the platform data directory for drafts and preferences
    pub data_dir: Option<PathBuf>,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bundle_url: None,
            submit_url: None,
            probe_url: DEFAULT_PROBE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            data_dir: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document into a builder so callers can layer overrides.
    pub fn from_toml_str(source: &str) -> Result<AppConfigBuilder, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        Ok(AppConfigBuilder {
            bundle_url: file.bundle_url,
            submit_url: file.submit_url,
            probe_url: file.probe_url,
            app_name: file.app_name,
            data_dir: file.data_dir,
            sync_interval: file.sync_interval_secs.map(Duration::from_secs),
            request_timeout: file.request_timeout_secs.map(Duration::from_secs),
            probe_timeout: file.probe_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Read and parse a TOML configuration file.
    pub fn from_toml_file(path: impl Into<PathBuf>) -> Result<AppConfigBuilder, ConfigError> {
        let path = path.into();
        let source = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.bundle_url, &self.submit_url].into_iter().flatten() {
            check_url(url)?;
        }
        check_url(&self.probe_url)?;
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingValue("app_name"));
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "sync_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn check_url(url: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    bundle_url: Option<String>,
    submit_url: Option<String>,
    probe_url: Option<String>,
    app_name: Option<String>,
    data_dir: Option<PathBuf>,
    sync_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
}

/// Builder for AppConfig
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    bundle_url: Option<String>,
    submit_url: Option<String>,
    probe_url: Option<String>,
    app_name: Option<String>,
    data_dir: Option<PathBuf>,
    sync_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    probe_timeout: Option<Duration>,
}

impl AppConfigBuilder {
    /// Set the bundle endpoint
    pub fn bundle_url(mut self, url: impl Into<String>) -> Self {
        self.bundle_url = Some(url.into());
        self
    }

    /// Set the submission endpoint
    pub fn submit_url(mut self, url: impl Into<String>) -> Self {
        self.submit_url = Some(url.into());
        self
    }

    pub fn probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Fill every value not set here from `other`.
    pub fn or(self, other: AppConfigBuilder) -> Self {
        Self {
            bundle_url: self.bundle_url.or(other.bundle_url),
            submit_url: self.submit_url.or(other.submit_url),
            probe_url: self.probe_url.or(other.probe_url),
            app_name: self.app_name.or(other.app_name),
            data_dir: self.data_dir.or(other.data_dir),
            sync_interval: self.sync_interval.or(other.sync_interval),
            request_timeout: self.request_timeout.or(other.request_timeout),
            probe_timeout: self.probe_timeout.or(other.probe_timeout),
        }
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            bundle_url: self.bundle_url,
            submit_url: self.submit_url,
            probe_url: self.probe_url.unwrap_or(defaults.probe_url),
            app_name: self.app_name.unwrap_or(defaults.app_name),
            data_dir: self.data_dir,
            sync_interval: self.sync_interval.unwrap_or(defaults.sync_interval),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            probe_timeout: self.probe_timeout.unwrap_or(defaults.probe_timeout),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
