//! Client configuration: backend address, timeouts and the routes used for
//! redirects. Values are public; do not store secrets here.

use std::{env, time::Duration};

/// Production backend used when `GYMDESK_API_BASE_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "https://api.gymdesk.app";
/// Environment variable that overrides the backend address.
pub const BASE_URL_ENV: &str = "GYMDESK_API_BASE_URL";
/// Timeout applied to every request, retries included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between a successful refresh and the replay, so the new cookie settles.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Public entry point users are sent to when the session is gone.
pub const DEFAULT_ENTRY_ROUTE: &str = "/";
/// Non-privileged route for authenticated users lacking the required role.
pub const DEFAULT_DENIED_ROUTE: &str = "/dashboard";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub entry_route: String,
    pub denied_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            entry_route: DEFAULT_ENTRY_ROUTE.to_string(),
            denied_route: DEFAULT_DENIED_ROUTE.to_string(),
        }
    }

    /// Loads the defaults and applies `GYMDESK_API_BASE_URL` when it holds a value.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV)
            .ok()
            .and_then(|value| normalize_value(&value))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    #[must_use]
    pub fn with_entry_route(mut self, route: impl Into<String>) -> Self {
        self.entry_route = route.into();
        self
    }

    #[must_use]
    pub fn with_denied_route(mut self, route: impl Into<String>) -> Self {
        self.denied_route = route.into();
        self
    }
}

/// Trims a configuration value and rejects blanks.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
