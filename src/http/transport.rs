//! The transport seam: sends one request and reports the raw result.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use crate::config::{APPLICATION_JSON, RequestConfig};
use crate::pipeline::RawError;
use crate::response::{RequestHandle, Response, ResponseData, status_text};
use crate::settings::ClientSettings;

/// Executes HTTP requests.
///
/// Implementations return `Ok` only for 2xx replies; any other reply is
/// `RawError::Status` with the response attached. A cancelled
/// `config.cancel_token` must surface as `RawError::Cancelled`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, RawError>;
}

/// [`Transport`] backed by a dedicated reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        Ok(Self::new(settings.build_client()?))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, RawError> {
        let mut headers = config.headers.clone();
        if sends_body(&method) && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        let mut builder = self.client.request(method.clone(), url).headers(headers);
        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(data) = &data {
            builder = builder.json(data);
        }

        let reply = builder.send().await.map_err(RawError::Transport)?;

        let status = reply.status();
        let headers = reply.headers().clone();
        let request = RequestHandle {
            method,
            url: reply.url().clone(),
        };
        let body = reply.bytes().await.map_err(RawError::Transport)?;

        debug!("{} {} -> {}", request.method, request.url, status);

        let response = Response {
            status,
            status_text: status_text(status),
            data: parse_body(&headers, &body),
            headers,
            config: config.clone(),
            request,
        };

        if status.is_success() {
            Ok(response)
        } else {
            Err(RawError::Status(Box::new(response)))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, data, config))]
    async fn execute(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, RawError> {
        debug!("{} {}...", method, url);

        let Some(token) = config.cancel_token.clone() else {
            return self.send(method, url, data, config).await;
        };

        if token.is_cancelled() {
            return Err(RawError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("{} {} cancelled while in flight", method, url);
                Err(RawError::Cancelled)
            }
            result = self.send(method.clone(), url, data, config) => result,
        }
    }
}

fn sends_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// True for `application/json` and `+json` media types.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let media_type = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == APPLICATION_JSON || media_type.ends_with("+json")
}

/// Parses the body when the server labelled it JSON; otherwise keeps the text.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> ResponseData {
    if is_json_content_type(headers) {
        match serde_json::from_slice(body) {
            Ok(value) => return ResponseData::Json(value),
            Err(e) => debug!("Body labelled JSON did not parse ({}), keeping text", e),
        }
    }
    ResponseData::Text(String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::make_cancel_source;
    use crate::config::with_cancel_token;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::from_settings(&ClientSettings::default()).unwrap()
    }

    fn headers_with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_is_json_content_type() {
        assert!(is_json_content_type(&headers_with_content_type("application/json")));
        assert!(is_json_content_type(&headers_with_content_type(
            "Application/JSON; charset=utf-8"
        )));
        assert!(is_json_content_type(&headers_with_content_type(
            "application/problem+json"
        )));
        assert!(!is_json_content_type(&headers_with_content_type("text/html")));
        assert!(!is_json_content_type(&HeaderMap::new()));
    }

    #[test]
    fn test_parse_body() {
        let json = headers_with_content_type("application/json");
        assert_eq!(
            parse_body(&json, br#"{"a":1}"#),
            ResponseData::Json(json!({"a": 1}))
        );
        assert_eq!(
            parse_body(&json, b"not json"),
            ResponseData::Text("not json".into())
        );
        assert_eq!(
            parse_body(&HeaderMap::new(), br#"{"a":1}"#),
            ResponseData::Text(r#"{"a":1}"#.into())
        );
    }

    #[tokio::test]
    async fn test_execute_parses_json_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/items?page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let config = RequestConfig::new().query("page", "2");
        let response = transport()
            .execute(Method::GET, &format!("{}/items", server.url()), None, &config)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data, ResponseData::Json(json!({"items": []})));
        assert_eq!(response.request.method, Method::GET);
        assert_eq!(response.request.url.path(), "/items");
    }

    #[tokio::test]
    async fn test_execute_sends_json_body_with_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/things")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "thing"})))
            .with_status(201)
            .create_async()
            .await;

        let response = transport()
            .execute(
                Method::POST,
                &format!("{}/things", server.url()),
                Some(json!({"name": "thing"})),
                &RequestConfig::new(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.data, ResponseData::Text(String::new()));
    }

    #[tokio::test]
    async fn test_execute_default_content_type_without_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/things/1")
            .match_header("content-type", "application/json")
            .with_status(204)
            .create_async()
            .await;

        transport()
            .execute(
                Method::PUT,
                &format!("{}/things/1", server.url()),
                None,
                &RequestConfig::new(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_keeps_caller_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/things/1")
            .match_header("content-type", "application/merge-patch+json")
            .with_status(200)
            .create_async()
            .await;

        let config = RequestConfig::new()
            .header("Content-Type", "application/merge-patch+json")
            .unwrap();
        transport()
            .execute(
                Method::PATCH,
                &format!("{}/things/1", server.url()),
                Some(json!({"name": null})),
                &config,
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_get_has_no_default_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("content-type", Matcher::Missing)
            .with_status(200)
            .create_async()
            .await;

        transport()
            .execute(Method::GET, &server.url(), None, &RequestConfig::new())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_non_success_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("nope")
            .create_async()
            .await;

        let err = transport()
            .execute(
                Method::GET,
                &format!("{}/missing", server.url()),
                None,
                &RequestConfig::new(),
            )
            .await
            .unwrap_err();

        match err {
            RawError::Status(response) => {
                assert_eq!(response.status, StatusCode::NOT_FOUND);
                assert_eq!(response.data, ResponseData::Text("nope".into()));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_already_cancelled() {
        let source = make_cancel_source();
        source.cancel();
        let config = with_cancel_token(&RequestConfig::new().cancel_source(source));

        let err = transport()
            .execute(Method::GET, "http://127.0.0.1:1/", None, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, RawError::Cancelled));
    }

    #[tokio::test]
    async fn test_execute_cancelled_in_flight() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let source = make_cancel_source();
        let config = with_cancel_token(&RequestConfig::new().cancel_source(source.clone()));
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            source.cancel();
        });

        let err = transport()
            .execute(Method::GET, &format!("http://{}/", addr), None, &config)
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert!(matches!(err, RawError::Cancelled));
    }

    #[tokio::test]
    async fn test_execute_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .execute(
                Method::GET,
                &format!("http://{}/", addr),
                None,
                &RequestConfig::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RawError::Transport(_)));
    }
}
