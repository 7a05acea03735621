//! Configuration for the sessiongate server

use crate::auth::SESSION_SCHEME;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Log level filter string.
    /// Set via config file or SG_LOG_LEVEL env var. Overridden by RUST_LOG.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Authentication parameters
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authentication parameters. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Authentication scheme. Only "session" is supported.
    #[serde(rename = "type", default = "default_auth_type")]
    pub kind: String,

    /// Idle time in seconds after which a session expires
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: u64,

    /// PBKDF2 iteration count
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Derived key length in bytes
    #[serde(default = "default_pbkdf2_key_length")]
    pub pbkdf2_key_length: usize,

    /// Interval in seconds between background sweeps of expired sessions.
    /// 0 disables the sweep; expired sessions are then only dropped when
    /// they are next presented.
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

// Default value functions for serde
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_level() -> String {
    "sessiongate=debug,tower_http=debug".to_string()
}

fn default_auth_type() -> String {
    SESSION_SCHEME.to_string()
}

fn default_session_duration_secs() -> u64 {
    30 * 60
}

fn default_pbkdf2_iterations() -> u32 {
    150_000
}

fn default_pbkdf2_key_length() -> usize {
    64
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kind: default_auth_type(),
            session_duration_secs: default_session_duration_secs(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            pbkdf2_key_length: default_pbkdf2_key_length(),
            sweep_interval_secs: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
            auth: AuthConfig::default(),
        }
    }
}

impl AuthConfig {
    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    /// Sweep period, or `None` when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.kind.eq_ignore_ascii_case(SESSION_SCHEME) {
            return Err(ConfigError::Invalid(format!(
                "unknown authorization type: {}",
                self.kind
            )));
        }
        if self.session_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "session duration must be greater than 0".to_string(),
            ));
        }
        if self.pbkdf2_iterations == 0 {
            return Err(ConfigError::Invalid(
                "PBKDF2 iteration count must be greater than 0".to_string(),
            ));
        }
        if self.pbkdf2_key_length == 0 {
            return Err(ConfigError::Invalid(
                "PBKDF2 key length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from `SG_*` variables looked up through `var`.
    ///
    /// A variable that is set but does not parse is an error, not a default.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&var, "SG_LISTEN_ADDR")? {
            config.listen_addr = addr;
        }

        if let Some(level) = var("SG_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(secs) = parse_var(&var, "SG_SESSION_DURATION")? {
            config.auth.session_duration_secs = secs;
        }
        if let Some(iterations) = parse_var(&var, "SG_PBKDF2_ITERATIONS")? {
            config.auth.pbkdf2_iterations = iterations;
        }
        if let Some(length) = parse_var(&var, "SG_PBKDF2_KEY_LENGTH")? {
            config.auth.pbkdf2_key_length = length;
        }
        if let Some(secs) = parse_var(&var, "SG_SWEEP_INTERVAL")? {
            config.auth.sweep_interval_secs = secs;
        }

        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    fn load_with(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // An explicitly named file must load
        if let Some(path) = var("SG_CONFIG") {
            return Self::from_file(&path);
        }

        // Try default config file locations
        for path in &["sessiongate.toml", "/etc/sessiongate/config.toml"] {
            if std::path::Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to environment variables
        Self::from_vars(var)
    }

    /// Validate the whole configuration before the service accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()
    }

    /// Serialize config to TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{key}={raw:?}: {e}"))),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
