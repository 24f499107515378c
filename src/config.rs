//! Per-request configuration and the pure helpers that derive new configs.

use anyhow::Result;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cancel::CancelSource;

/// The JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// Options for a single request.
///
/// The composer functions in this module never mutate a caller's config;
/// they return modified copies.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: HeaderMap,
    pub cancel_token: Option<CancellationToken>,
    pub cancel_source: Option<CancelSource>,
    /// Overrides the client's default timeout for this request.
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header, replacing any existing value with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn cancel_source(mut self, source: CancelSource) -> Self {
        self.cancel_source = Some(source);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// True when `Accept` names exactly one media type and it is `application/json`.
    ///
    /// Parameters (`;charset=...`) and case are ignored. A missing header, a
    /// list of types, or repeated `Accept` headers all count as "not exclusive".
    pub fn accepts_json_exclusively(&self) -> bool {
        let mut values = self.headers.get_all(ACCEPT).iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return false;
        };
        let Ok(value) = value.to_str() else {
            return false;
        };
        if value.contains(',') {
            return false;
        }
        let media_type = value.split(';').next().unwrap_or_default().trim();
        media_type.eq_ignore_ascii_case(APPLICATION_JSON)
    }
}

/// Returns a copy of `base` with `Accept: application/json`.
///
/// Any caller-supplied `Accept` is overridden; all other headers are kept.
pub fn with_accept_json(base: &RequestConfig) -> RequestConfig {
    let mut config = base.clone();
    config
        .headers
        .insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    config
}

/// Returns a copy of `base` whose `cancel_token` is resolved.
///
/// An explicit token wins; otherwise the token of `cancel_source` is used;
/// otherwise no token is set.
pub fn with_cancel_token(base: &RequestConfig) -> RequestConfig {
    let mut config = base.clone();
    config.cancel_token = base
        .cancel_token
        .clone()
        .or_else(|| base.cancel_source.as_ref().map(CancelSource::token));
    config
}
