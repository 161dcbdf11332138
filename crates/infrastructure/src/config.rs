//! Client configuration.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. an optional config file (TOML, JSON or YAML, by extension)
//! 3. `MEMORIZER_*` environment variables
//! 4. explicit overrides (command-line flags)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use memorizer_application::{RefreshFailurePolicy, SessionOptions};
use serde::Deserialize;
use url::Url;

/// Default account service location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MEMORIZER";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape.
    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The request timeout must be positive.
    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Settings for the auth client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Account service base URL.
    pub base_url: Url,
    /// Token file; the platform config directory is used when unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// What to do when the start-up refresh fails.
    pub refresh_failure_policy: RefreshFailurePolicy,
}

/// Values that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces `base_url`.
    pub base_url: Option<String>,
    /// Replaces `storage_path`.
    pub storage_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads configuration from defaults, `file`, the process environment
    /// and `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` is given but missing or invalid, or if any
    /// value has the wrong shape.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load_with_env(file, None, overrides)
    }

    /// Like [`load`](Self::load), reading environment variables from `env`
    /// instead of the process when given.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("refresh_failure_policy", "keep_stale_session")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option(
                "storage_path",
                overrides
                    .storage_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?;

        let config: Self = builder.build()?.try_deserialize()?;
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session manager options derived from this configuration.
    #[must_use]
    pub const fn session_options(&self) -> SessionOptions {
        SessionOptions {
            refresh_failure_policy: self.refresh_failure_policy,
        }
    }
}
