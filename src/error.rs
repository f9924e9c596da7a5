//! Error types for the dashboard client

/// Errors surfaced by the remote API client and the services built on it
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server returned HTML instead of JSON. The API might be misconfigured.")]
    HtmlResponse,

    #[error("Server returned non-JSON response")]
    NonJson,

    #[error("Unexpected data format from server")]
    UnexpectedFormat,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Authentication failed. Please sign in again.")]
    SessionExpired,

    #[error("No refresh token stored")]
    MissingRefreshToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("No data available for the selected devices and metric")]
    EmptyExport,

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::Csv(err.to_string())
    }
}

/// Result type alias for dashboard client operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;
