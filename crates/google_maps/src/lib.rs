use std::error;
use std::fmt;
use std::sync::Arc;

use route_planning::provider::ProviderError;

pub mod client;
pub mod distance_matrix;
pub mod geocoding;

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    /// A response whose `status` field is neither `OK` nor `ZERO_RESULTS`.
    Status {
        status: String,
        message: Option<String>,
    },
    RateLimitReached,
    Other(String),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response({}) {}", status_code, url),
            },
            ApiError::Status { status, message } => match message {
                Some(message) => write!(f, "Google Maps status {status}: {message}"),
                None => write!(f, "Google Maps status {status}"),
            },
            ApiError::RateLimitReached => write!(f, "Rate limit reached."),
            ApiError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::JsonError(Arc::new(e))
    }
}

impl From<ApiError> for ProviderError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::RateLimitReached => ProviderError::RateLimited,
            ApiError::RequestError(_) => ProviderError::Unavailable(e.to_string()),
            ApiError::InvalidResponse { status_code, .. } if status_code.is_server_error() => {
                ProviderError::Unavailable(e.to_string())
            }
            ApiError::Status { ref status, .. } if status == "UNKNOWN_ERROR" => {
                ProviderError::Unavailable(e.to_string())
            }
            _ => ProviderError::InvalidResponse(e.to_string()),
        }
    }
}

/// Maps the `status` field shared by all Maps web service responses.
pub(crate) fn check_status(status: &str, message: Option<String>) -> Result<(), ApiError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(ApiError::RateLimitReached),
        other => Err(ApiError::Status {
            status: other.to_owned(),
            message,
        }),
    }
}
