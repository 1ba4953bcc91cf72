//! Fast tier configuration.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix for environment overrides, e.g. `FINCACHE__PORT=6380`.
pub const ENV_PREFIX: &str = "FINCACHE";

/// Which fast tier implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Network key-value service (default).
    #[default]
    Redis,
    /// In-process tier for single-instance deployments and tests.
    Memory,
}

/// Configuration for the fast tier.
///
/// Every field has a default pointing at a local instance, so an empty
/// configuration is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastTierConfig {
    /// `false` forces disabled mode without any connection attempt.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logical database index.
    #[serde(default)]
    pub database: i64,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Budget for each individual operation.
    #[serde(default = "default_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Entry capacity of the memory backend.
    #[serde(default = "default_memory_max_capacity")]
    pub memory_max_capacity: u64,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_memory_max_capacity() -> u64 {
    10_000
}

impl Default for FastTierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::default(),
            host: default_host(),
            port: default_port(),
            database: 0,
            password: None,
            connect_timeout_ms: default_timeout_ms(),
            operation_timeout_ms: default_timeout_ms(),
            memory_max_capacity: default_memory_max_capacity(),
        }
    }
}

impl FastTierConfig {
    /// Configuration for an in-process tier.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    /// Configuration that always yields disabled mode.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Loads configuration from an optional TOML file plus `FINCACHE__*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );

        let loaded: FastTierConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Like [`load`](Self::load), but never fails: loading errors fall back
    /// to [`disabled`](Self::disabled), never to enabled defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid fast tier configuration, fast tier disabled");
                Self::disabled()
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.database < 0 {
            return Err(ConfigError::Invalid("database must be >= 0".into()));
        }
        if self.connect_timeout_ms == 0 || self.operation_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        Ok(())
    }

    /// Renders the connection URL, with the credential percent-encoded.
    pub fn connection_url(&self) -> String {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.database
            ),
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }

    /// Connection URL safe for logs.
    pub fn redacted_url(&self) -> String {
        let auth = if self.password.is_some() { ":***@" } else { "" };
        format!(
            "redis://{}{}:{}/{}",
            auth, self.host, self.port, self.database
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
