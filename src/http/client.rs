//! Verb-level facade over a [`Transport`], with normalized outcomes.

use anyhow::Result;
use log::debug;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use super::transport::{ReqwestTransport, Transport};
use crate::config::{RequestConfig, with_accept_json, with_cancel_token};
use crate::error::ClassifiedError;
use crate::pipeline::settle;
use crate::response::Response;
use crate::settings::ClientSettings;

/// HTTP client whose every call ends in `Ok(Response)` or a [`ClassifiedError`].
///
/// Each `Client` owns its transport; defaults installed at construction are
/// never shared with other clients.
pub struct Client<T: Transport = ReqwestTransport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Client<ReqwestTransport> {
    /// Creates a client with the default settings (3000 ms timeout).
    pub fn new() -> Result<Self> {
        Self::with_settings(&ClientSettings::default())
    }

    pub fn with_settings(settings: &ClientSettings) -> Result<Self> {
        debug!(
            "Building client (timeout {:?}, user agent {})",
            settings.timeout, settings.user_agent
        );
        Ok(Self::with_transport(ReqwestTransport::from_settings(
            settings,
        )?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request and runs the result through the normalization pipeline.
    #[tracing::instrument(skip(self, data, config))]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        let config = with_cancel_token(config);
        let result = self.transport.execute(method, url, data, &config).await;
        settle(result)
    }

    pub async fn get(&self, url: &str, config: &RequestConfig) -> Result<Response, ClassifiedError> {
        self.request(Method::GET, url, None, config).await
    }

    pub async fn delete(
        &self,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.request(Method::DELETE, url, data, config).await
    }

    pub async fn post(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.request(Method::POST, url, Some(data), config).await
    }

    pub async fn put(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.request(Method::PUT, url, Some(data), config).await
    }

    pub async fn patch(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.request(Method::PATCH, url, Some(data), config).await
    }

    /// Like [`Client::get`], but requires a JSON reply.
    pub async fn get_json(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.get(url, &with_accept_json(config)).await
    }

    pub async fn delete_json(
        &self,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.delete(url, data, &with_accept_json(config)).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.post(url, data, &with_accept_json(config)).await
    }

    pub async fn put_json(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.put(url, data, &with_accept_json(config)).await
    }

    pub async fn patch_json(
        &self,
        url: &str,
        data: Value,
        config: &RequestConfig,
    ) -> Result<Response, ClassifiedError> {
        self.patch(url, data, &with_accept_json(config)).await
    }
}
