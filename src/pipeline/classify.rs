use log::debug;
use reqwest::StatusCode;

use super::RawError;
use crate::error::{ClassifiedError, ErrorKind};

/// Tags a failure with exactly one [`ErrorKind`].
///
/// Precedence: format, cancelled, network (no reply), validation (422),
/// other. The failure is always returned, never recovered from.
pub fn classify_failure(err: RawError) -> ClassifiedError {
    let message = err.to_string();

    let classified = match err {
        RawError::Format { response, source } => ClassifiedError::new(
            ErrorKind::Format,
            message,
            Some(*response),
            Some(Box::new(source)),
        ),
        RawError::Cancelled => ClassifiedError::new(ErrorKind::Cancelled, message, None, None),
        RawError::Transport(source) => {
            ClassifiedError::new(ErrorKind::Network, message, None, Some(Box::new(source)))
        }
        RawError::Status(response) => {
            let kind = if response.status == StatusCode::UNPROCESSABLE_ENTITY {
                ErrorKind::Validation
            } else {
                ErrorKind::Other
            };
            let message = format!(
                "request failed with status {} {}",
                response.status.as_u16(),
                response.status_text
            );
            ClassifiedError::new(kind, message.trim_end(), Some(*response), None)
        }
    };

    debug!("Classified request failure as {}: {}", classified.kind(), classified.message());
    classified
}
