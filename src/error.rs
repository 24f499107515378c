//! Classified request failures.

use reqwest::StatusCode;
use std::fmt;

use crate::response::Response;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single category a failed request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// JSON was requested exclusively but the body did not parse.
    Format,
    /// The request's cancellation token fired.
    Cancelled,
    /// No reply was received (timeout, DNS, connection refused, ...).
    Network,
    /// The server replied with 422 Unprocessable Entity.
    Validation,
    /// The server replied with any other non-2xx status.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "format"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A failed request, tagged with exactly one [`ErrorKind`].
///
/// The kind is fixed when the error is built; the predicates below are
/// derived from it, so exactly one of them is ever true.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    response: Option<Box<Response>>,
    #[source]
    source: Option<BoxError>,
}

impl ClassifiedError {
    pub(crate) fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        response: Option<Response>,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            response: response.map(Box::new),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The server's reply, when one was received.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    pub fn into_response(self) -> Option<Response> {
        self.response.map(|r| *r)
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|r| r.status)
    }

    pub fn is_format(&self) -> bool {
        self.kind == ErrorKind::Format
    }

    pub fn is_cancel(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_other(&self) -> bool {
        self.kind == ErrorKind::Other
    }
}
