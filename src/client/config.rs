use std::path::PathBuf;
use std::time::Duration;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Bundle endpoint override
pub const ENV_API_URL: &str = "FORMS_API_URL";
/// Submission endpoint override
pub const ENV_SUBMIT_URL: &str = "FORMS_SUBMIT_URL";
/// Data directory override
pub const ENV_DATA_DIR: &str = "FORMS_DATA_DIR";
/// Path of an optional TOML config file
pub const ENV_CONFIG: &str = "FORMS_CONFIG";

const DRAFTS_DIR: &str = "drafts";
const CACHE_FILE: &str = "forms.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Application configuration wrapper.
///
/// Layers, highest first: environment variables, the TOML file named by
/// `FORMS_CONFIG`, built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = AppConfig::builder();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            builder = builder.bundle_url(url);
        }
        if let Ok(url) = std::env::var(ENV_SUBMIT_URL) {
            builder = builder.submit_url(url);
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            builder = builder.data_dir(dir);
        }
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            builder = builder.or(AppConfig::from_toml_file(path)?);
        }
        Self::with_builder(builder)
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self {
            app: builder.build()?,
        })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn bundle_url(&self) -> Option<&str> {
        self.app.bundle_url.as_deref()
    }

    /// Submission endpoint, derived from the bundle endpoint when unset.
    pub fn submit_url(&self) -> Option<String> {
        self.app.submit_url.clone().or_else(|| {
            self.bundle_url()
                .map(|base| format!("{}/submit", base.trim_end_matches('/')))
        })
    }

    pub fn probe_url(&self) -> &str {
        &self.app.probe_url
    }

    pub fn sync_interval(&self) -> Duration {
        self.app.sync_interval
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout
    }

    pub fn probe_timeout(&self) -> Duration {
        self.app.probe_timeout
    }

    /// Root for drafts and preferences.
    ///
    /// The explicit override wins, then the platform data directory, then
    /// `~/.forms-app`, then the system temp directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.app.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(&self.app.app_name))
            .or_else(|| dirs::home_dir().map(|home| home.join(format!(".{}", self.app.app_name))))
            .unwrap_or_else(|| std::env::temp_dir().join(&self.app.app_name))
    }

    /// Directory holding one file per draft.
    pub fn drafts_dir(&self) -> PathBuf {
        self.data_dir().join(DRAFTS_DIR)
    }

    /// Location of the cached form bundle.
    pub fn cache_path(&self) -> PathBuf {
        let base = match &self.app.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()
                .map(|dir| dir.join(&self.app.app_name))
                .unwrap_or_else(|| self.data_dir()),
        };
        base.join(CACHE_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join(PREFERENCES_FILE)
    }
}
