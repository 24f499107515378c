//! Client-wide defaults, fixed when a client is constructed.

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Default user agent, e.g. `jsonfetch/1.2.0`.
pub fn default_user_agent() -> String {
    format!("jsonfetch/{}", env!("JSONFETCH_VERSION"))
}

/// Settings for an isolated client instance.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// Headers sent with every request unless the request overrides them.
    pub default_headers: HeaderMap,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: default_user_agent(),
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientSettings {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds a fresh reqwest client carrying these defaults.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(self.default_headers.clone())
            .build()
    }
}
