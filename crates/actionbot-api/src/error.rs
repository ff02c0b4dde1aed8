//! Error types for backend requests.

use serde::Deserialize;

/// Result type alias for backend requests.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP transport error (connect, timeout, reading the body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status code.
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: Option<String>,
        /// Longer description extracted from the body.
        description: Option<String>,
    },

    /// Backend answered 2xx but flagged the operation as unsuccessful.
    #[error("Backend rejected the request: {}", message.as_deref().unwrap_or("no details"))]
    Rejected {
        /// Message returned alongside `success: false`.
        message: Option<String>,
    },

    /// Response body is not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),
}

/// Error body shapes the backend is known to send.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ApiError {
    /// Builds a status error from a response body.
    ///
    /// JSON bodies contribute their `message`/`error` and
    /// `description`/`error_description` fields; anything else is kept
    /// verbatim as the message.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let (message, description) = match serde_json::from_str::<ErrorBody>(trimmed) {
            Ok(parsed) => {
                let error_text = parsed.error.and_then(|value| match value {
                    serde_json::Value::String(text) => Some(text),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                });
                (
                    parsed.message.or(error_text),
                    parsed.description.or(parsed.error_description),
                )
            }
            Err(_) if trimmed.is_empty() => (None, None),
            Err(_) => (Some(trimmed.to_string()), None),
        };

        Self::Status {
            status,
            message,
            description,
        }
    }

    /// HTTP status code associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Primary human-readable message carried by the error.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.clone(),
            Self::Http(err) => Some(err.to_string()),
            Self::Json(err) => Some(err.to_string()),
            Self::Url(err) => Some(err.to_string()),
            Self::InvalidBaseUrl(url) => Some(url.clone()),
        }
    }

    /// Secondary description carried by the error, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Status { description, .. } => description.as_deref(),
            _ => None,
        }
    }
}
