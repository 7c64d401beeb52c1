/*
[INPUT]:  Error sources (HTTP transport, API status, serialization, URL)
[OUTPUT]: Structured registry error type with transport/status classification
[POS]:    Error handling layer - unified error type for the registry client
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for registry calls
#[derive(Error, Debug)]
pub enum RegistryError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry answered with a non-success status
    #[error("registry returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// True when the registry could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, RegistryError::Http(_))
    }

    /// HTTP status code, when the registry answered
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Api { status, .. } => Some(*status),
            RegistryError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Create an API error from status code and response body
    pub fn api_error(status: StatusCode, body: impl Into<String>) -> Self {
        RegistryError::Api {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
