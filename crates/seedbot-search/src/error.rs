//! Error types for search and metadata lookups.

use thiserror::Error;

/// Errors that can occur when searching or looking up titles.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A required token was not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Unexpected HTTP status.
    #[error("request failed with HTTP {0}")]
    Status(u16),

    /// The request did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// The URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No result at this position in the last search.
    #[error("invalid torrent index {0}")]
    InvalidIndex(usize),

    /// The result has neither a magnet URI nor a link.
    #[error("result {0} has no download link")]
    NoLink(usize),

    /// The metadata API answered with an error message.
    #[error("{0}")]
    Lookup(String),

    /// Redirect chain too long or without a location.
    #[error("bad redirect: {0}")]
    Redirect(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if let Some(status) = e.status() {
            SearchError::Status(status.as_u16())
        } else {
            SearchError::Http(e.to_string())
        }
    }
}

impl From<url::ParseError> for SearchError {
    fn from(e: url::ParseError) -> Self {
        SearchError::InvalidUrl(e.to_string())
    }
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
