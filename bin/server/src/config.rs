//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (nested fields use the `__` separator, e.g.
//! `ENGINE__STEP_TIMEOUT_SECONDS=120`). Every field has a default so a
//! bare environment boots a working server.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Cron runner settings.
    #[serde(default)]
    pub cron: CronSettings,
}

/// Engine-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Upper bound for a single rule invocation, in seconds.
    #[serde(default = "default_step_timeout_seconds")]
    pub step_timeout_seconds: u64,
}

/// Cron runner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CronSettings {
    /// Interval between polls for due cron triggers, in seconds.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_step_timeout_seconds() -> u64 {
    60
}

fn default_poll_interval_seconds() -> u64 {
    30
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            step_timeout_seconds: default_step_timeout_seconds(),
        }
    }
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            engine: EngineSettings::default(),
            cron: CronSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if present configuration fails to parse.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
