//! Session-layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest session code the registry will hand out.
pub(crate) const MIN_CODE_LEN: usize = 8;

/// Longest session code; anything beyond this stops being typeable.
pub(crate) const MAX_CODE_LEN: usize = 16;

/// Timeouts and limits for the session registry.
///
/// Sensible defaults are provided; the server overrides individual fields
/// from its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// A session with no activity (join, move, reset) for longer than this
    /// is removed by the sweep.
    ///
    /// Default: 30 minutes.
    pub ttl: Duration,

    /// How often the sweep runs.
    ///
    /// Default: 5 minutes.
    pub sweep_interval: Duration,

    /// Length of generated session codes, in base36 characters.
    ///
    /// Default: 8. Clamped to `8..=16`.
    pub code_len: usize,
}

impl SessionConfig {
    /// Code length actually used by the registry.
    pub fn effective_code_len(&self) -> usize {
        self.code_len.clamp(MIN_CODE_LEN, MAX_CODE_LEN)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            code_len: MIN_CODE_LEN,
        }
    }
}
