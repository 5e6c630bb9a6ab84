//! # pp-config
//!
//! Runtime settings for the picpop binary. Values come from built-in
//! defaults overridden by `PICPOP__*` environment variables (for example
//! `PICPOP__PORT`), after `.env` has been read into the environment.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const ENV_PREFIX: &str = "PICPOP";
const DEV_SESSION_SECRET: &str = "picpop-dev-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub log_level: String,
    pub session_secret: Option<SecretString>,
    pub push_endpoint: Option<String>,
    pub push_timeout_ms: u64,
    #[serde(default)]
    pub cors_origins: String,
    pub worker_poll_interval_ms: u64,
    pub worker_batch_size: i64,
}

impl AppConfig {
    /// Reads `.env` (if any), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    /// Builds from an explicit environment source; used by `load` and tests.
    pub fn from_source(env: config::Environment) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:picpop.db")?
            .set_default("log_level", "info")?
            .set_default("push_timeout_ms", 5000)?
            .set_default("cors_origins", "")?
            .set_default("worker_poll_interval_ms", 1000)?
            .set_default("worker_batch_size", 50)?
            .add_source(env)
            .build()?;

        let app: Self = cfg.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_development() && self.session_secret.is_none() {
            return Err(ConfigError::Invalid(format!(
                "{ENV_PREFIX}__SESSION_SECRET is required when app_env is {}",
                self.app_env
            )));
        }
        if !(1..=1000).contains(&self.worker_batch_size) {
            return Err(ConfigError::Invalid("worker_batch_size must be within 1..=1000".into()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    /// The configured secret, or a fixed one in development.
    pub fn session_secret(&self) -> SecretString {
        match &self.session_secret {
            Some(secret) if !secret.expose_secret().is_empty() => secret.clone(),
            _ => SecretString::from(DEV_SESSION_SECRET.to_string()),
        }
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    /// The push relay URL, if one is configured and non-blank.
    pub fn push_endpoint(&self) -> Option<&str> {
        self.push_endpoint.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}
