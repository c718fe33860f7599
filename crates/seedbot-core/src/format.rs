//! Chat message formatting.
//!
//! Everything here is pure: the same input always yields the same text.
//! The progress tracker relies on this to skip edits that would not change
//! anything.

use chrono::{DateTime, FixedOffset, Utc};
use seedbot_models::Torrent;
use seedbot_tracker::Renderer;
use url::Url;

/// Maximum length of a Telegram text message.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Longest torrent name shown before truncation.
const MAX_NAME_CHARS: usize = 100;

/// Width of the progress bar in cells.
const BAR_WIDTH: usize = 20;

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format a byte count with binary units and two decimals.
pub fn human_readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = SIZE_UNITS[0];
    for (i, candidate) in SIZE_UNITS.iter().enumerate() {
        unit = candidate;
        if size < 1024.0 || i == SIZE_UNITS.len() - 1 {
            break;
        }
        size /= 1024.0;
    }
    format!("{:.2} {}", size, unit)
}

/// Format a UTC timestamp in the display offset, e.g. `Mar 04 2024, 09:05 PM`.
pub fn format_date(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset)
        .format("%b %d %Y, %I:%M %p")
        .to_string()
}

/// A fixed-width bar such as `█████---------------` for 25%.
pub fn progress_bar(percent: f64) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((BAR_WIDTH as f64 * clamped) / 100.0).floor() as usize;
    format!("{}{}", "█".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Escape HTML special characters for Telegram HTML mode.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_CHARS {
        let head: String = name.chars().take(MAX_NAME_CHARS).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Layout of the per-torrent progress message.
#[derive(Debug, Clone)]
pub struct TorrentMessageRenderer {
    /// Where completed downloads are served, if anywhere.
    download_base_url: Option<Url>,
    /// Offset used for the "Added" date.
    utc_offset: FixedOffset,
}

impl TorrentMessageRenderer {
    pub fn new(download_base_url: Option<Url>, utc_offset: FixedOffset) -> Self {
        Self {
            download_base_url,
            utc_offset,
        }
    }

    /// Link to a completed download, with the name percent-encoded.
    pub fn download_link(&self, name: &str) -> Option<String> {
        let mut url = self.download_base_url.clone()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(name);
        Some(url.to_string())
    }
}

impl Renderer for TorrentMessageRenderer {
    fn render(&self, torrent: &Torrent, free_space: u64) -> String {
        let progress = torrent.progress();
        let mut text = format!(
            "ID: {}, Name: {}\nProgress: [{}] {:.2}%\n",
            torrent.id,
            truncate_name(&torrent.name),
            progress_bar(progress),
            progress
        );

        if torrent.is_complete() {
            if let Some(link) = self.download_link(&torrent.name) {
                text.push_str(&format!("\nDownload link: {}", link));
            }
        } else {
            text.push_str(&format!(
                "ETA: {}\nSize: {}\nAdded: {}",
                torrent.eta,
                human_readable_size(torrent.total_size),
                format_date(torrent.added_date, self.utc_offset)
            ));
        }

        text.push_str(&format!(
            "\nFree Disk Space = {}",
            human_readable_size(free_space)
        ));
        text
    }
}

/// Format every torrent for `/list`, split into HTML messages that fit the
/// Telegram length limit.
pub fn format_torrent_list(torrents: &[Torrent], free_space: u64) -> Vec<String> {
    let footer = format!(
        "<b>Free Disk Space</b> = {}",
        human_readable_size(free_space)
    );

    if torrents.is_empty() {
        return vec![format!("No torrents found.\n\n{}", footer)];
    }

    let mut messages = Vec::new();
    let mut current = String::new();

    for torrent in torrents {
        let entry = format!(
            "<b>{}</b> {}\n<code>[{}]</code> {:.1}% · {} · {}\n\n",
            torrent.id,
            escape_html(&truncate_name(&torrent.name)),
            progress_bar(torrent.progress()),
            torrent.progress(),
            torrent.status.label(),
            human_readable_size(torrent.total_size)
        );
        if !current.is_empty() && current.len() + entry.len() > TELEGRAM_MESSAGE_LIMIT {
            messages.push(std::mem::take(&mut current));
        }
        current.push_str(&entry);
    }

    if current.len() + footer.len() > TELEGRAM_MESSAGE_LIMIT {
        messages.push(std::mem::take(&mut current));
    }
    current.push_str(&footer);
    messages.push(current);
    messages
}
