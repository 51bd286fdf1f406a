use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{}", ApiError::describe_status(.status, .message, .body))]
    Status {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Stored session token is not a valid header value")]
    InvalidToken,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Business errors arrive as `{"message": "..."}` next to a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    fn describe_status(status: &u16, message: &Option<String>, body: &str) -> String {
        match message {
            Some(message) => format!("Status {}: {}", status, message),
            None if body.is_empty() => format!("Status {}", status),
            None => format!("Status {}: {}", status, Self::truncate_body(body)),
        }
    }

    /// Build an error for a non-2xx response, keeping the raw body intact.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        ApiError::Status {
            status: status.as_u16(),
            message,
            body,
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-supplied `message` field of an error body
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Raw response body of a non-2xx response
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// True when no response was received
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.status().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_extracts_message() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Invalid credentials"}"#.to_string(),
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.server_message(), Some("Invalid credentials"));
        assert_eq!(err.body(), Some(r#"{"message":"Invalid credentials"}"#));
        assert_eq!(err.to_string(), "Status 400: Invalid credentials");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_from_status_without_json_body() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), None);
        assert_eq!(err.to_string(), "Status 401: Unauthorized");

        let empty = ApiError::from_status(StatusCode::NOT_FOUND, String::new());
        assert_eq!(empty.to_string(), "Status 404");
    }

    #[test]
    fn test_long_body_truncated_in_display_only() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, body.clone());
        assert!(err.to_string().contains("truncated, 520 total bytes"));
        assert_eq!(err.body().map(str::len), Some(body.len()));
    }
}
