//! Telegram bot interface for Seedbot.
//!
//! Lets authorized users search indexers, add torrents to Transmission and
//! watch them download from a Telegram chat. Progress messages are kept up
//! to date by the tracker in `seedbot-tracker`; this crate supplies its
//! Telegram channel and Transmission source.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_TOKEN`: Bot token from @BotFather
//! - `JACKETT_URL`, `JACKETT_TOKEN`: Jackett instance for `/search`
//! - `OMDB_TOKEN`: OMDb API key for `/imdb`
//!
//! See `seedbot_core::BotConfig` for the optional settings.
//!
//! # Example
//!
//! ```no_run
//! use seedbot_core::BotConfig;
//! use seedbot_telegram::SeedBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bot = SeedBot::new(BotConfig::from_env()?).await?;
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod channel;
pub mod error;
pub mod handlers;
pub mod source;
pub mod state;

pub use bot::SeedBot;
pub use channel::TelegramChannel;
pub use error::{BotError, Result};
pub use handlers::Command;
pub use source::TransmissionSource;
pub use state::BotState;
