//! Seedbot Core - shared configuration and formatting.
//!
//! - **config**: environment-driven settings for every Seedbot component
//! - **format**: human-readable sizes, dates and the progress message layout

pub mod config;
pub mod format;

pub use config::{load_dotenv, BotConfig, ConfigError};
pub use format::{
    escape_html, format_date, format_torrent_list, human_readable_size, progress_bar,
    TorrentMessageRenderer, TELEGRAM_MESSAGE_LIMIT,
};
