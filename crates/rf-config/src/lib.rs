//! # rf-config
//!
//! Client settings, layered: built-in defaults, then an optional TOML file,
//! then `FORUM__*` environment variables (a `.env` file is read first).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "FORUM";
/// Names a config file to use instead of [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_PATH_VAR: &str = "FORUM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rusty-forum.toml";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TOKEN_PATH: &str = ".rusty-forum/token";
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 4000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid api_url {0:?}: expected an http:// or https:// URL")]
    InvalidApiUrl(String),

    #[error("notification_ttl_ms must be greater than zero")]
    InvalidNotificationTtl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the forum backend.
    pub api_url: String,
    /// Where the bearer token is kept between runs.
    pub token_path: PathBuf,
    /// Keep the token in memory only.
    pub ephemeral_session: bool,
    pub notification_ttl_ms: u64,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            ephemeral_session: false,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    /// Reads `.env`, the config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
        Self::from_sources(explicit.as_deref(), None)
    }

    /// Builds the layered configuration. An explicit `file` must exist; the
    /// default file is optional. `env` replaces the process environment when
    /// given.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        let env_source = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env);

        let settings: Self = config::Config::builder()
            .add_source(file_source)
            .add_source(env_source)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        debug!(
            api_url = %settings.api_url,
            ephemeral = settings.ephemeral_session,
            "configuration loaded"
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.notification_ttl_ms == 0 {
            return Err(ConfigError::InvalidNotificationTtl);
        }
        Ok(())
    }

    /// The base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}
