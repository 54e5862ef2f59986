//! Client configuration.
//!
//! All settings have defaults; `from_env` overlays environment variables on
//! top of them.

use std::time::Duration;

use thiserror::Error;

/// Public API the posts samples talk to.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Transport timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const ENV_BASE_URL: &str = "RESOURCE_CLIENT_BASE_URL";
const ENV_TIMEOUT_MS: &str = "RESOURCE_CLIENT_TIMEOUT_MS";
const ENV_DEADLINE_MS: &str = "RESOURCE_CLIENT_DEADLINE_MS";

/// What happens to sibling requests that are no longer needed: the losers
/// of a `race`, or the rest of a `fetch_many` after one request failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Let them run to completion and discard their results.
    #[default]
    Detach,
    /// Abort their tasks as soon as the outcome is decided.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Transport-level timeout for a whole round trip.
    pub timeout: Duration,
    /// Optional per-call deadline enforced around the transport.
    pub deadline: Option<Duration>,
    pub cancel_policy: CancelPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            deadline: None,
            cancel_policy: CancelPolicy::Detach,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `RESOURCE_CLIENT_BASE_URL`,
    /// `RESOURCE_CLIENT_TIMEOUT_MS` and `RESOURCE_CLIENT_DEADLINE_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(ConfigError::Empty(ENV_BASE_URL));
            }
            config.base_url = url.to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout = parse_millis(ENV_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEADLINE_MS) {
            config.deadline = Some(parse_millis(ENV_DEADLINE_MS, &raw)?);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }
}

fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .ok_or_else(|| ConfigError::InvalidMillis {
            var,
            value: raw.to_string(),
        })
}
