//! Error types for the Transmission client.

use thiserror::Error;

/// Errors that can occur when talking to Transmission.
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// The daemon does not know this torrent id.
    #[error("torrent {0} not found")]
    NotFound(i64),

    /// The daemon answered with a non-success result string.
    #[error("Transmission error: {0}")]
    Rpc(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Unexpected HTTP status.
    #[error("Transmission RPC failed with HTTP {0}")]
    Status(u16),

    /// Credentials rejected.
    #[error("Transmission rejected the credentials")]
    Unauthorized,

    /// The daemon kept rejecting the session id.
    #[error("failed negotiating Transmission session id")]
    SessionNegotiation,

    /// The request did not finish in time.
    #[error("Transmission request timed out")]
    Timeout,

    /// The response did not have the expected shape.
    #[error("invalid Transmission response: {0}")]
    InvalidResponse(String),

    /// Gave up connecting at startup.
    #[error("could not connect to Transmission after {attempts} attempts: {last}")]
    ConnectFailed { attempts: u32, last: String },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TransmissionError {
    /// Whether retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransmissionError::Http(_)
                | TransmissionError::Status(_)
                | TransmissionError::SessionNegotiation
                | TransmissionError::Timeout
        )
    }
}

impl From<reqwest::Error> for TransmissionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransmissionError::Timeout
        } else {
            TransmissionError::Http(e.to_string())
        }
    }
}

/// Result type for Transmission operations.
pub type Result<T> = std::result::Result<T, TransmissionError>;
