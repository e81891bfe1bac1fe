use serde::Deserialize;
use thiserror::Error;

/// Maximum length for extracted error messages
const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// Closed set of outcomes for a failed API call.
///
/// Callers branch on these variants instead of probing response bodies:
/// `Http` carries the message extracted from the error body, `Network`
/// wraps transport failures where no response was received.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error body shape used across the API: a `detail` or `message` field.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Truncate a message to avoid dragging whole response bodies around
    fn truncate(message: &str) -> String {
        if message.len() <= MAX_ERROR_MESSAGE_LENGTH {
            message.to_string()
        } else {
            let mut end = MAX_ERROR_MESSAGE_LENGTH;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &message[..end], message.len())
        }
    }

    /// Build an `Http` error from a non-success response body.
    ///
    /// Extraction precedence: JSON `detail` field, else JSON `message`
    /// field, else the HTTP status reason.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let extracted = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail.or(b.message));

        let message = match extracted {
            Some(m) if !m.is_empty() => Self::truncate(&m),
            _ => status
                .canonical_reason()
                .unwrap_or("HTTP error")
                .to_string(),
        };

        ApiError::Http { status, message }
    }

    /// The HTTP status for `Http` errors, `None` otherwise.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(reqwest::StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn prefers_detail_over_message() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Invalid tag list", "message": "ignored"}"#,
        );
        assert_eq!(err.to_string(), "Invalid tag list");
    }

    #[test]
    fn falls_back_to_message_field() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "File too large"}"#,
        );
        assert_eq!(err.to_string(), "File too large");
    }

    #[test]
    fn falls_back_to_status_reason_for_unparseable_body() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "<html>nope</html>");
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn empty_detail_falls_back_to_status_reason() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": ""}"#);
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn truncates_oversized_messages() {
        let body = format!(r#"{{"detail": "{}"}}"#, "x".repeat(2000));
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, &body);
        let text = err.to_string();
        assert!(text.len() < 600);
        assert!(text.contains("truncated"));
    }

    #[test]
    fn unauthorized_is_recognized() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "{}");
        assert!(err.is_unauthorized());
    }
}
