//! Seams between the tracker and the outside world.
//!
//! The tracker never talks to Transmission or Telegram directly. It polls a
//! [`TorrentSource`], renders with a [`Renderer`] and pushes text through a
//! [`NotificationChannel`]. The Telegram crate provides the real
//! implementations; tests use in-memory ones.

use std::path::Path;

use async_trait::async_trait;
use seedbot_models::{DestinationId, MessageRef, Torrent, TorrentId};

use crate::error::{DeliveryError, FetchError};

/// Read access to the torrent daemon.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Fetch the current state of one torrent.
    async fn torrent(&self, id: TorrentId) -> Result<Torrent, FetchError>;

    /// Free space in bytes for the given directory.
    async fn free_space(&self, path: &Path) -> Result<u64, FetchError>;
}

/// Chat messaging API used to display progress.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Send a new message, returning its id.
    async fn send(&self, destination: DestinationId, text: &str)
        -> Result<MessageRef, DeliveryError>;

    /// Replace the text of an existing message.
    ///
    /// Implementations must report identical-content rejections as
    /// [`DeliveryError::Unchanged`].
    async fn edit(
        &self,
        destination: DestinationId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError>;

    /// Delete a message.
    async fn delete(&self, destination: DestinationId, message: MessageRef)
        -> Result<(), DeliveryError>;
}

/// Turns a torrent snapshot into message text.
///
/// Must be deterministic: the same torrent and free space always produce the
/// same text.
pub trait Renderer: Send + Sync {
    fn render(&self, torrent: &Torrent, free_space: u64) -> String;
}
