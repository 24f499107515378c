use log::debug;
use serde::de::IgnoredAny;

use super::{Outcome, RawError};
use crate::response::{Response, ResponseData};

/// Checks a 2xx response against what the caller asked for.
///
/// Only requests that accepted `application/json` exclusively are inspected.
/// For those, a body the transport left as text must still parse as JSON;
/// otherwise the response is turned into a [`RawError::Format`]. The
/// response itself is never modified.
pub fn normalize_response(response: Response) -> Outcome {
    if !response.config.accepts_json_exclusively() {
        return Outcome::Success(response);
    }

    let parsed = match &response.data {
        ResponseData::Json(_) => Ok(()),
        ResponseData::Text(text) => serde_json::from_str::<IgnoredAny>(text).map(|_| ()),
    };

    match parsed {
        Ok(()) => Outcome::Success(response),
        Err(source) => {
            debug!(
                "{} {} returned {} with a body that is not JSON: {}",
                response.request.method, response.request.url, response.status, source
            );
            Outcome::Failure(RawError::Format {
                response: Box::new(response),
                source,
            })
        }
    }
}
