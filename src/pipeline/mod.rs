//! Two-stage response pipeline.
//!
//! Every transport result passes through [`normalize_response`] (success
//! side) and then, if it failed, [`classify_failure`]. [`settle`] wires the
//! two together so callers only ever see `Ok(Response)` or a
//! [`ClassifiedError`].

mod classify;
mod normalize;

pub use classify::classify_failure;
pub use normalize::normalize_response;

use crate::error::ClassifiedError;
use crate::response::Response;

/// An unclassified failure, as produced by the transport or the normalizer.
#[derive(Debug, thiserror::Error)]
pub enum RawError {
    /// The body was supposed to be JSON and failed to parse.
    #[error("malformed JSON response: {source}")]
    Format {
        response: Box<Response>,
        #[source]
        source: serde_json::Error,
    },

    /// The request's cancellation token fired before it settled.
    #[error("request cancelled")]
    Cancelled,

    /// The transport failed before a reply was received.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server replied with a non-2xx status.
    #[error("request failed with status {}", .0.status)]
    Status(Box<Response>),
}

impl RawError {
    pub fn response(&self) -> Option<&Response> {
        match self {
            RawError::Format { response, .. } | RawError::Status(response) => Some(response),
            RawError::Cancelled | RawError::Transport(_) => None,
        }
    }
}

/// Result of the success-normalization stage.
#[derive(Debug)]
pub enum Outcome {
    Success(Response),
    Failure(RawError),
}

/// Runs a transport result through both pipeline stages.
pub fn settle(result: Result<Response, RawError>) -> Result<Response, ClassifiedError> {
    let outcome = match result {
        Ok(response) => normalize_response(response),
        Err(err) => Outcome::Failure(err),
    };

    match outcome {
        Outcome::Success(response) => Ok(response),
        Outcome::Failure(err) => Err(classify_failure(err)),
    }
}
