//! Client configuration

use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default change-feed polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for connecting to the hosted backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub base_url: String,

    /// Public (anon) API key, sent as `apikey` on every request
    pub api_key: String,

    /// Access token of a signed-in user; the anon key is used as bearer otherwise
    pub access_token: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// How often the REST change feed polls for differences
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the user access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the change-feed polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// REST endpoint for a collection
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Auth endpoint
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }
}
