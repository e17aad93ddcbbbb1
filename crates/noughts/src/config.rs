//! Server configuration, loaded from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `NOUGHTS_BIND` | `127.0.0.1:8080` | listen address |
//! | `NOUGHTS_SESSION_TTL_SECS` | `1800` | idle time before a session is reaped |
//! | `NOUGHTS_SWEEP_INTERVAL_SECS` | `300` | how often the reaper runs |
//! | `NOUGHTS_IDLE_TIMEOUT_SECS` | unset | close connections silent this long |
//! | `NOUGHTS_MAX_NAME_LEN` | `32` | longest accepted display name |

use std::str::FromStr;
use std::time::Duration;

use noughts_session::SessionConfig;

pub const ENV_BIND: &str = "NOUGHTS_BIND";
pub const ENV_SESSION_TTL: &str = "NOUGHTS_SESSION_TTL_SECS";
pub const ENV_SWEEP_INTERVAL: &str = "NOUGHTS_SWEEP_INTERVAL_SECS";
pub const ENV_IDLE_TIMEOUT: &str = "NOUGHTS_IDLE_TIMEOUT_SECS";
pub const ENV_MAX_NAME_LEN: &str = "NOUGHTS_MAX_NAME_LEN";

/// Errors raised while loading or validating [`ServerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{key}: cannot parse {value:?}")]
    Parse { key: &'static str, value: String },

    /// A value parsed but is out of bounds.
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub session: SessionConfig,
    /// Close a connection that sends nothing for this long. `None` keeps
    /// connections open indefinitely.
    pub idle_timeout: Option<Duration>,
    pub max_name_len: usize,
    /// Capacity of the router's command channel.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session: SessionConfig::default(),
            idle_timeout: None,
            max_name_len: 32,
            command_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Reads the `NOUGHTS_*` variables, falling back to defaults.
    ///
    /// # Errors
    /// [`ConfigError`] if a variable is malformed or out of bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup(ENV_BIND) {
            config.bind_addr = bind;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_SESSION_TTL)? {
            config.session.ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_SWEEP_INTERVAL)? {
            config.session.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_IDLE_TIMEOUT)? {
            // 0 means "off", same as leaving it unset.
            config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(len) = parse_var::<usize>(&lookup, ENV_MAX_NAME_LEN)? {
            config.max_name_len = len;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field bounds.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.trim().is_empty() {
            return Err(invalid(ENV_BIND, "must not be empty"));
        }
        if self.session.ttl.is_zero() {
            return Err(invalid(ENV_SESSION_TTL, "must be at least 1 second"));
        }
        if self.session.sweep_interval.is_zero() {
            return Err(invalid(ENV_SWEEP_INTERVAL, "must be at least 1 second"));
        }
        if self.max_name_len == 0 {
            return Err(invalid(ENV_MAX_NAME_LEN, "must be at least 1"));
        }
        if self.command_buffer == 0 {
            return Err(invalid("command_buffer", "must be at least 1"));
        }
        Ok(())
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session.ttl = ttl;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.session.sweep_interval = interval;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_name_len(mut self, len: usize) -> Self {
        self.max_name_len = len;
        self
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse { key, value: raw }),
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
