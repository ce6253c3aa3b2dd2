//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts against a local
//! backend with zero configuration.

use std::time::Duration;

use parley_shared::constants::{ERROR_TTL, POLL_INTERVAL, REVEAL_TICK};

use crate::chat::ChatConfig;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    /// Env: `PARLEY_API_BASE_URL`
    /// Default: `http://localhost:8000`
    pub api_base_url: String,

    /// `name=value` cookie seeded into the credential jar, to reuse a
    /// session established elsewhere.
    /// Env: `PARLEY_SESSION_COOKIE`
    /// Default: none.
    pub session_cookie: Option<String>,

    /// Per-request timeout.
    /// Env: `PARLEY_REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout: Duration,

    /// Typing-flag poll period.
    /// Env: `PARLEY_POLL_INTERVAL_MS`
    /// Default: `3000`
    pub poll_interval: Duration,

    /// Reply reveal period, one character per tick.
    /// Env: `PARLEY_REVEAL_TICK_MS`
    /// Default: `30`
    pub reveal_tick: Duration,

    /// How long an error stays on the banner.
    /// Env: `PARLEY_ERROR_TTL_SECS`
    /// Default: `10`
    pub error_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            session_cookie: None,
            request_timeout: Duration::from_secs(30),
            poll_interval: POLL_INTERVAL,
            reveal_tick: REVEAL_TICK,
            error_ttl: ERROR_TTL,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PARLEY_API_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                tracing::warn!("Empty PARLEY_API_BASE_URL, using default");
            } else {
                config.api_base_url = url.to_string();
            }
        }

        if let Some(cookie) = lookup("PARLEY_SESSION_COOKIE") {
            let cookie = cookie.trim();
            if !cookie.is_empty() {
                config.session_cookie = Some(cookie.to_string());
            }
        }

        if let Some(secs) = parse_positive(&lookup, "PARLEY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(ms) = parse_positive(&lookup, "PARLEY_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_positive(&lookup, "PARLEY_REVEAL_TICK_MS") {
            config.reveal_tick = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_positive(&lookup, "PARLEY_ERROR_TTL_SECS") {
            config.error_ttl = Duration::from_secs(secs);
        }

        config
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            poll_interval: self.poll_interval,
            reveal_tick: self.reveal_tick,
        }
    }
}

/// Read a strictly positive integer. Zero periods would turn the timers
/// into busy loops, so they are rejected like unparsable values.
fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}
