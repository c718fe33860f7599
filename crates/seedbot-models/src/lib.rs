//! Core data models for Seedbot.
//!
//! This crate provides the data types shared by the Transmission client,
//! the progress tracker and the Telegram front end.

pub mod ids;
pub mod torrent;

// Re-export main types
pub use ids::{DestinationId, MessageRef, TorrentId};
pub use torrent::{Eta, Torrent, TorrentStatus};
