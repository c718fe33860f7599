//! Torrent progress tracking for Seedbot.
//!
//! Once a download is started from chat, the bot keeps the message it
//! replied with up to date until the torrent completes. This crate owns
//! that behaviour:
//!
//! - `TrackingStore` - which chat messages display which torrent
//! - `Reconciler` - one polling pass over every tracked torrent
//! - `ProgressTracker` - the shared store plus a background loop that starts
//!   when the first torrent is tracked and stops when the last one is gone
//!
//! The daemon, the chat API and the message layout are reached through the
//! traits in [`service`], so the loop can be driven entirely in memory.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use seedbot_tracker::{ProgressTracker, TrackerConfig};
//!
//! let tracker = ProgressTracker::new(
//!     TrackerConfig::default(),
//!     Arc::new(source),
//!     Arc::new(channel),
//!     Arc::new(renderer),
//! );
//!
//! // After replying to the user with message 100 in chat 1:
//! tracker.register_tracking(torrent_id, 1, 100).await;
//! ```
//!
//! # Failure handling
//!
//! | failure | effect |
//! |---|---|
//! | torrent not found | messages deleted, torrent untracked |
//! | transient poll error or timeout | torrent retried next tick |
//! | edit rejected as unchanged | ignored |
//! | edit timed out, rate limited or unreachable | message kept, re-rendered next tick |
//! | edit rejected otherwise | that one message deleted and dropped |
//! | panic inside a tick | logged, loop keeps its schedule |

pub mod config;
pub mod error;
pub mod reconciler;
pub mod service;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use config::TrackerConfig;
pub use error::{DeliveryError, FetchError, Result, TrackerError};
pub use reconciler::{should_render, Reconciler, TickReport};
pub use service::{NotificationChannel, Renderer, TorrentSource};
pub use store::{Subscription, TrackingStore};
pub use tracker::{LoopState, ProgressTracker};
