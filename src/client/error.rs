use miette::Diagnostic;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Machine-readable classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    RateLimited,
    Server,
    Transport,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            400 | 422 => ApiErrorKind::Validation,
            429 => ApiErrorKind::RateLimited,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Other,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("HighLevel API error ({status}): {message}")]
    #[diagnostic(code(highlevel::client::status))]
    Status { status: u16, message: String },

    #[error("Failed to connect to the HighLevel API")]
    #[diagnostic(
        code(highlevel::client::connection_failed),
        help("Check network connectivity, or point GHL_BASE_URL at the correct host.")
    )]
    Connection {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from the HighLevel API: {message}")]
    #[diagnostic(code(highlevel::client::invalid_response))]
    InvalidResponse { message: String },
}

impl ApiError {
    /// Build a status error from a non-success response body.
    ///
    /// The API answers with `{"statusCode", "message", "error"}` where
    /// `message` is either a string or a list of validation messages.
    pub fn from_response(status: u16, body: &str) -> Self {
        ApiError::Status {
            status,
            message: extract_message(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Status { status, .. } => ApiErrorKind::from_status(*status),
            ApiError::Connection { .. } => ApiErrorKind::Transport,
            ApiError::InvalidResponse { .. } => ApiErrorKind::Other,
        }
    }
}

fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }

    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };

    match json.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Array(messages)) => messages
            .iter()
            .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => json
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ApiError::Connection { source: e }
        } else {
            ApiError::InvalidResponse {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidResponse {
            message: e.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
