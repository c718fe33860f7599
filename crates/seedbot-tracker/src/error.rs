//! Error types for the tracker crate.

use std::time::Duration;

use seedbot_models::TorrentId;
use thiserror::Error;

/// Failure reported by a torrent source when polling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The daemon no longer knows this torrent.
    #[error("torrent {0} not found")]
    NotFound(TorrentId),

    /// Network or daemon error; the next tick retries.
    #[error("fetch failed: {0}")]
    Transient(String),
}

/// Failure reported by a notification channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// The edit was rejected because the text is identical.
    #[error("message content unchanged")]
    Unchanged,

    /// Rate limited or unreachable; the message may still be edited later.
    #[error("delivery deferred: {0}")]
    Transient(String),

    /// Any other rejection (message deleted, chat gone, bot blocked...).
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Errors surfaced while reconciling a single torrent.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Torrent source error.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Notification channel error.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// An external call did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl TrackerError {
    /// Whether the torrent is gone for good.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::Fetch(FetchError::NotFound(_)))
    }

    /// Whether an edit was a no-op.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, TrackerError::Delivery(DeliveryError::Unchanged))
    }

    /// Whether the edit may succeed on a later tick.
    pub fn is_retryable_delivery(&self) -> bool {
        matches!(
            self,
            TrackerError::Timeout { .. } | TrackerError::Delivery(DeliveryError::Transient(_))
        )
    }

    /// Whether the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackerError::Timeout { .. })
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
