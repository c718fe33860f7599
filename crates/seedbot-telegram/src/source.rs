//! Transmission as the tracker's torrent source.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use seedbot_models::{Torrent, TorrentId};
use seedbot_tracker::{FetchError, TorrentSource};
use seedbot_transmission::{TransmissionClient, TransmissionError};

/// Feeds the progress tracker from a Transmission daemon.
pub struct TransmissionSource {
    client: Arc<TransmissionClient>,
}

impl TransmissionSource {
    pub fn new(client: Arc<TransmissionClient>) -> Self {
        Self { client }
    }
}

/// Only a missing torrent is final; everything else is retried.
pub fn fetch_error(e: TransmissionError) -> FetchError {
    match e {
        TransmissionError::NotFound(id) => FetchError::NotFound(id),
        other => FetchError::Transient(other.to_string()),
    }
}

#[async_trait]
impl TorrentSource for TransmissionSource {
    async fn torrent(&self, id: TorrentId) -> Result<Torrent, FetchError> {
        self.client.torrent(id).await.map_err(fetch_error)
    }

    async fn free_space(&self, path: &Path) -> Result<u64, FetchError> {
        self.client.free_space(path).await.map_err(fetch_error)
    }
}
