//! JSON-friendly HTTP requests with a single, classified failure contract.
//!
//! Requests go through [`Client`]. A successful call yields a [`Response`];
//! every failure is a [`ClassifiedError`] tagged with exactly one
//! [`ErrorKind`]: format, cancelled, network, validation or other.

pub mod cancel;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod response;
pub mod settings;

pub use cancel::{CancelSource, make_cancel_source};
pub use config::{RequestConfig, with_accept_json, with_cancel_token};
pub use error::{ClassifiedError, ErrorKind};
pub use http::{Client, ReqwestTransport, Transport};
pub use pipeline::{Outcome, RawError, classify_failure, normalize_response, settle};
pub use response::{RequestHandle, Response, ResponseData};
pub use settings::ClientSettings;
