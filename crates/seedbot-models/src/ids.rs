//! Identifier aliases shared across crates.

/// Torrent identifier assigned by the Transmission daemon.
pub type TorrentId = i64;

/// Chat that displays a tracked torrent.
pub type DestinationId = i64;

/// Message within a chat.
pub type MessageRef = i32;
