//! Response model shared by the transport and the normalization pipeline.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RequestConfig;

/// Body of a response as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// The transport parsed the body into a structured value.
    Json(Value),
    /// The raw body, left for the caller to interpret.
    Text(String),
}

impl ResponseData {
    pub fn is_structured(&self) -> bool {
        matches!(self, ResponseData::Json(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            ResponseData::Text(_) => None,
        }
    }
}

/// The request that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    pub method: Method,
    pub url: Url,
}

/// A reply received from the server.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    /// The effective config the request was sent with.
    pub config: RequestConfig,
    pub request: RequestHandle,
    pub data: ResponseData,
}

impl Response {
    /// Deserializes the payload into `T`, parsing raw text on demand.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match &self.data {
            ResponseData::Json(value) => T::deserialize(value),
            ResponseData::Text(text) => serde_json::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        match &self.data {
            ResponseData::Text(text) => text.clone(),
            ResponseData::Json(value) => value.to_string(),
        }
    }
}

/// Canonical reason phrase for `status`, or an empty string when unknown.
pub fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}


#[cfg(test)]
mod tests {
    use super::test_support::response;
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn test_json_from_structured_data() {
        let resp = response(
            200,
            RequestConfig::new(),
            ResponseData::Json(serde_json::json!({"name": "widget"})),
        );
        let item: Item = resp.json().unwrap();
        assert_eq!(item.name, "widget");
    }

    #[test]
    fn test_json_from_text_data() {
        let resp = response(
            200,
            RequestConfig::new(),
            ResponseData::Text(r#"{"name": "gadget"}"#.to_string()),
        );
        let item: Item = resp.json().unwrap();
        assert_eq!(item.name, "gadget");
    }

    #[test]
    fn test_json_from_invalid_text() {
        let resp = response(
            200,
            RequestConfig::new(),
            ResponseData::Text("<html></html>".to_string()),
        );
        assert!(resp.json::<Item>().is_err());
        assert_eq!(resp.text(), "<html></html>");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(StatusCode::UNPROCESSABLE_ENTITY), "Unprocessable Entity");
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), "");
    }

    #[test]
    fn test_data_accessors() {
        let text = ResponseData::Text("x".to_string());
        assert!(!text.is_structured());
        assert_eq!(text.as_text(), Some("x"));
        assert!(text.as_json().is_none());

        let json = ResponseData::Json(Value::Null);
        assert!(json.is_structured());
        assert_eq!(json.as_json(), Some(&Value::Null));
    }
}
