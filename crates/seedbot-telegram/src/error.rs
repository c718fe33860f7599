//! Error types for the Telegram bot.

use seedbot_core::ConfigError;
use seedbot_search::SearchError;
use seedbot_transmission::TransmissionError;
use thiserror::Error;

/// Errors that can occur while starting or running the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Missing or invalid settings.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transmission could not be reached or refused a request.
    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    /// Jackett or OMDb failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Telegram API error.
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
