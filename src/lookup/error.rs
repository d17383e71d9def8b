use hyper::StatusCode;
use thiserror::Error;

/// Fallback for upstream failures which come without a message
pub const API_ERROR_FALLBACK: &str = "An error occurred while fetching data";

/// What users see for every failure which is not reported by the API itself
pub const FETCH_FAILED: &str = "Failed to fetch geolocation data. Please try again later.";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("API responded with status {0}")]
    Transport(StatusCode),
    #[error("API reported an error: {0}")]
    Api(String),
    #[error("Unexpected API response format")]
    UnexpectedFormat,
    #[error(transparent)]
    Connection(#[from] hyper::Error),
    #[error("Cannot build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("API response is not a valid JSON: {0}")]
    Body(#[from] serde_json::Error),
    #[error(transparent)]
    Uri(#[from] crate::uri_tools::UriError),
}

impl From<StatusCode> for LookupError {
    fn from(status_code: StatusCode) -> Self {
        LookupError::Transport(status_code)
    }
}

impl LookupError {
    /// Human-readable message to show instead of the error details
    pub fn user_message(&self) -> &str {
        match self {
            Self::Api(info) => info,
            _ => FETCH_FAILED,
        }
    }
}
