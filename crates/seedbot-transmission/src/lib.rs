//! Transmission RPC client for Seedbot.
//!
//! Talks to a Transmission daemon over its JSON-RPC HTTP endpoint,
//! including the `X-Transmission-Session-Id` handshake and optional basic
//! authentication. Every request carries the configured timeout.
//!
//! # Example
//!
//! ```no_run
//! use seedbot_transmission::{TransmissionClient, TransmissionConfig};
//!
//! # async fn run() -> seedbot_transmission::Result<()> {
//! let client = TransmissionClient::connect(TransmissionConfig::default()).await?;
//! for torrent in client.torrents().await? {
//!     println!("{} {:.1}%", torrent.name, torrent.progress());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod rpc;

pub use client::{AddSource, AddedTorrent, TransmissionClient};
pub use config::TransmissionConfig;
pub use error::{Result, TransmissionError};
