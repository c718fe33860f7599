//! Command handlers for the Telegram bot.

use std::sync::Arc;
use std::time::Duration;

use seedbot_core::{escape_html, format_torrent_list};
use seedbot_models::TorrentId;
use seedbot_search::Fetched;
use seedbot_transmission::AddedTorrent;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, ReplyParameters};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};

use crate::state::BotState;

/// Pause before the first render of a freshly added torrent, so the daemon
/// has picked up its metadata.
const ADD_SETTLE_DELAY: Duration = Duration::from_secs(1);

const SEARCH_FOOTER: &str =
    "Reply to this message with the index of the torrent you want to download.";

/// Bot commands that can be invoked with /.
///
/// Short aliases are separate hidden variants.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Search for torrents: /search <query>")]
    Search(String),
    #[command(hide)]
    S(String),

    #[command(description = "Search using an IMDb link: /imdb <link>")]
    Imdb(String),

    #[command(description = "Add a magnet link or .torrent URL: /torrent <link>")]
    Torrent(String),
    #[command(hide)]
    Magnet(String),
    #[command(hide)]
    Add(String),

    #[command(description = "List all torrents")]
    List,
    #[command(hide)]
    Ls,

    #[command(description = "Show a torrent and follow its progress: /info <id>")]
    Info(String),
    #[command(hide)]
    I(String),

    #[command(description = "Start torrents: /start <id> [id ...]")]
    Start(String),

    #[command(rename = "force_start", description = "Start torrents now, skipping the queue")]
    ForceStart(String),
    #[command(hide)]
    Fs(String),

    #[command(description = "Stop torrents: /stop <id> [id ...]")]
    Stop(String),

    #[command(description = "Delete torrents and their data: /delete <id> [id ...]")]
    Delete(String),
    #[command(hide)]
    Del(String),

    #[command(description = "Move a torrent to the Movies folder: /movie <id>")]
    Movie(String),
    #[command(hide)]
    M(String),

    #[command(description = "Move a torrent to the TV folder: /tv <id>")]
    Tv(String),
    #[command(hide)]
    T(String),

    #[command(description = "Show help message")]
    Help,
    #[command(hide)]
    H,
}

/// Bulk operations taking one or more torrent ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentAction {
    Start,
    ForceStart,
    Stop,
    Delete,
}

impl TorrentAction {
    fn command(self) -> &'static str {
        match self {
            TorrentAction::Start => "start",
            TorrentAction::ForceStart => "force_start",
            TorrentAction::Stop => "stop",
            TorrentAction::Delete => "delete",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            TorrentAction::Start => "start",
            TorrentAction::ForceStart => "force start",
            TorrentAction::Stop => "stop",
            TorrentAction::Delete => "delete",
        }
    }

    fn past(self) -> &'static str {
        match self {
            TorrentAction::Start => "started",
            TorrentAction::ForceStart => "force started",
            TorrentAction::Stop => "stopped",
            TorrentAction::Delete => "deleted",
        }
    }
}

/// Target folders for `/movie` and `/tv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Library {
    Movies,
    Tv,
}

impl Library {
    fn label(self) -> &'static str {
        match self {
            Library::Movies => "Movies",
            Library::Tv => "TV",
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Library::Movies => "Usage: /movie <torrent_id> or /m <torrent_id>",
            Library::Tv => "Usage: /tv <torrent_id> or /t <torrent_id>",
        }
    }
}

/// Only magnet links and direct .torrent URLs are accepted by `/torrent`.
pub fn is_addable_link(link: &str) -> bool {
    link.starts_with("magnet:") || link.ends_with(".torrent")
}

/// Zero-based result index from a reply such as `3` or `3.`.
pub fn parse_selection(text: &str) -> Option<usize> {
    text.trim()
        .split('.')
        .next()?
        .trim()
        .parse::<usize>()
        .ok()?
        .checked_sub(1)
}

/// The single argument of a command, if there is exactly one.
fn single_arg(args: &str) -> Option<&str> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Some(arg),
        _ => None,
    }
}

/// Success report for a bulk action.
pub fn summary_message(action: TorrentAction, names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [name] if action != TorrentAction::Delete => {
            Some(format!("Torrent {} {} successfully.", name, action.past()))
        }
        _ => {
            let plural = if names.len() > 1 { "s" } else { "" };
            Some(format!(
                "Successfully {} {} torrent{}:\n- {}",
                action.past(),
                names.len(),
                plural,
                names.join("\n- ")
            ))
        }
    }
}

pub fn help_text() -> String {
    "<b>Available Commands</b>\n\n\
    1. /list or /ls - List all torrents with their IDs and progress.\n\
    2. /delete or /del &lt;id&gt; [id ...] - Delete torrents and their data.\n\
    3. /start &lt;id&gt; [id ...] - Start paused torrents.\n\
    4. /force_start or /fs &lt;id&gt; [id ...] - Start torrents now, skipping the queue.\n\
    5. /stop &lt;id&gt; [id ...] - Stop torrents.\n\
    6. /movie or /m &lt;id&gt; - Move to the Movies folder.\n\
    7. /tv or /t &lt;id&gt; - Move to the TV folder.\n\
    8. /search or /s &lt;query&gt; - Search for content (e.g. \"The Matrix\", \"Simpsons s01e01\").\n\
    9. /imdb &lt;link&gt; - Search using IMDb information.\n\
    10. /torrent or /magnet or /add &lt;link&gt; - Add a magnet link or .torrent URL.\n\
    11. /info or /i &lt;id&gt; - Show a torrent and follow its progress.\n\n\
    /help or /h - Show this help message."
        .to_string()
}

fn is_authorized(msg: &Message, state: &BotState) -> bool {
    match state.config.authorized_users {
        None => true,
        Some(_) => msg
            .from
            .as_ref()
            .is_some_and(|user| state.config.is_authorized(user.id.0)),
    }
}

/// Whether a failed edit of the placeholder calls for sending the render as
/// a new message instead.
fn needs_fresh_message(e: &RequestError) -> bool {
    !matches!(e, RequestError::Api(ApiError::MessageNotModified))
}

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) -> ResponseResult<Message> {
    bot.send_message(msg.chat.id, text).await
}

/// Handle /help.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, help_text())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /search.
pub async fn handle_search(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    query: String,
) -> ResponseResult<()> {
    let query = query.trim();
    if query.is_empty() {
        reply(&bot, &msg, "Usage: /search <query>").await?;
        return Ok(());
    }

    let status = bot
        .send_message(
            msg.chat.id,
            format!("Searching for torrents... {}", escape_html(query)),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    run_search(&bot, &msg, &state, query, status.id).await
}

/// Handle /imdb.
pub async fn handle_imdb(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    args: String,
) -> ResponseResult<()> {
    let Some(link) = single_arg(&args) else {
        reply(&bot, &msg, "Usage: /imdb <movie url>").await?;
        return Ok(());
    };

    let query = match state.omdb.title_for(link).await {
        Ok(query) => query,
        Err(e) => {
            warn!(chat_id = %msg.chat.id, error = %e, "IMDb lookup failed");
            reply(&bot, &msg, format!("Failed to look up IMDb title: {}", e)).await?;
            return Ok(());
        }
    };

    let status = reply(&bot, &msg, format!("Searching for: {}", query)).await?;
    run_search(&bot, &msg, &state, &query, status.id).await
}

/// Query Jackett and show the results in the `status` message.
async fn run_search(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    query: &str,
    status: MessageId,
) -> ResponseResult<()> {
    let results = match state.jackett.search(query).await {
        Ok(results) => results,
        Err(e) => {
            warn!(query = %query, error = %e, "Jackett search failed");
            bot.edit_message_text(msg.chat.id, status, format!("Error querying Jackett: {}", e))
                .await?;
            return Ok(());
        }
    };

    if results.is_empty() {
        bot.edit_message_text(msg.chat.id, status, "No results found.")
            .await?;
        return Ok(());
    }

    let text = format!(
        "<pre>{}\n\n{}</pre>",
        escape_html(&results.format_results()),
        SEARCH_FOOTER
    );
    if let Err(e) = bot
        .edit_message_text(msg.chat.id, status, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!(chat_id = %msg.chat.id, error = %e, "Failed to show search results");
        reply(
            bot,
            msg,
            "An error occurred while formatting the message. Please try again later.",
        )
        .await?;
    }

    state.store_results(msg.chat.id.0, results).await;
    Ok(())
}

/// Handle /torrent, /magnet and /add.
pub async fn handle_add_link(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    args: String,
) -> ResponseResult<()> {
    let Some(link) = single_arg(&args) else {
        reply(&bot, &msg, "Usage: /torrent <magnet_link_or_torrent_url>").await?;
        return Ok(());
    };
    if !is_addable_link(link) {
        reply(&bot, &msg, "Please provide a valid magnet link or torrent file URL.").await?;
        return Ok(());
    }

    match state.transmission.add_magnet_or_url(link).await {
        Ok(added) => announce_added(&bot, &msg, &state, added).await,
        Err(e) => {
            reply(&bot, &msg, format!("Failed to add torrent: {}", e)).await?;
            Ok(())
        }
    }
}

/// Handle a numbered reply to a search results message.
pub async fn handle_reply(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(results) = state.results_for(msg.chat.id.0).await else {
        reply(
            &bot,
            &msg,
            "No search results found in context. Please start a new search.",
        )
        .await?;
        return Ok(());
    };

    let link = msg
        .text()
        .and_then(parse_selection)
        .and_then(|index| results.torrent_link(index).ok());
    let Some(link) = link else {
        reply(
            &bot,
            &msg,
            "Invalid selection. Please reply with a valid index number.",
        )
        .await?;
        return Ok(());
    };

    match add_search_result(&state, link).await {
        Ok(added) => announce_added(&bot, &msg, &state, added).await,
        Err(e) => {
            warn!(chat_id = %msg.chat.id, error = %e, "Failed to add search result");
            reply(&bot, &msg, format!("Failed to add torrent: {}", e)).await?;
            Ok(())
        }
    }
}

/// Magnets go straight to the daemon; other links are fetched here first,
/// since indexer links are usually only reachable from the bot's network.
async fn add_search_result(state: &BotState, link: &str) -> crate::error::Result<AddedTorrent> {
    if link.starts_with("magnet:") {
        return Ok(state.transmission.add_magnet_or_url(link).await?);
    }

    let added = match state.jackett.download_torrent_file(link).await? {
        Fetched::Metainfo(bytes) => state.transmission.add_metainfo(bytes).await?,
        Fetched::Magnet(magnet) => state.transmission.add_magnet_or_url(&magnet).await?,
    };
    Ok(added)
}

/// Confirm an added torrent, render it once and start following it.
async fn announce_added(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    added: AddedTorrent,
) -> ResponseResult<()> {
    let sent = bot
        .send_message(
            msg.chat.id,
            format!(
                "Torrent added successfully to Transmission. - {} (ID: {})",
                added.name, added.id
            ),
        )
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    tokio::time::sleep(ADD_SETTLE_DELAY).await;
    let mut tracked = sent.id;
    match render_torrent(state, added.id).await {
        Ok(text) => match bot.edit_message_text(msg.chat.id, sent.id, text.clone()).await {
            Ok(_) => {}
            Err(e) if !needs_fresh_message(&e) => {
                debug!(torrent_id = %added.id, "initial render unchanged");
            }
            Err(e) => {
                debug!(torrent_id = %added.id, error = %e, "initial edit failed, sending a new message");
                match reply(bot, msg, text).await {
                    Ok(fresh) => tracked = fresh.id,
                    Err(e) => warn!(torrent_id = %added.id, error = %e, "Failed to send progress message"),
                }
            }
        },
        Err(e) => warn!(torrent_id = %added.id, error = %e, "Failed to render new torrent"),
    }

    state
        .tracker
        .register_tracking(added.id, msg.chat.id.0, tracked.0)
        .await;
    info!(chat_id = %msg.chat.id, torrent_id = %added.id, name = %added.name, "Torrent added");
    Ok(())
}

async fn render_torrent(state: &BotState, id: TorrentId) -> seedbot_transmission::Result<String> {
    let torrent = state.transmission.torrent(id).await?;
    state.progress_text(&torrent).await
}

/// Handle /list.
pub async fn handle_list(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let listing = async {
        let torrents = state.transmission.torrents().await?;
        let free_space = state.transmission.free_space(&state.config.data_dir).await?;
        Ok::<_, seedbot_transmission::TransmissionError>(format_torrent_list(&torrents, free_space))
    };

    match listing.await {
        Ok(messages) => {
            for text in messages {
                bot.send_message(msg.chat.id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
        Err(e) => {
            reply(&bot, &msg, format!("Failed to list torrents: {}", e)).await?;
        }
    }
    Ok(())
}

/// Handle /info: show a torrent and keep the message up to date.
pub async fn handle_info(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    args: String,
) -> ResponseResult<()> {
    let Some(arg) = single_arg(&args) else {
        reply(&bot, &msg, "Usage: /info <torrent_id>").await?;
        return Ok(());
    };

    let id = match arg.parse::<TorrentId>() {
        Ok(id) => id,
        Err(e) => {
            reply(&bot, &msg, format!("Failed to get torrent info: {}", e)).await?;
            return Ok(());
        }
    };

    match render_torrent(&state, id).await {
        Ok(text) => {
            let sent = reply(&bot, &msg, text).await?;
            state
                .tracker
                .register_tracking(id, msg.chat.id.0, sent.id.0)
                .await;
        }
        Err(e) => {
            reply(&bot, &msg, format!("Failed to get torrent info: {}", e)).await?;
        }
    }
    Ok(())
}

/// Handle /start, /force_start, /stop and /delete.
pub async fn handle_action(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    action: TorrentAction,
    args: String,
) -> ResponseResult<()> {
    let ids: Vec<&str> = args.split_whitespace().collect();
    if ids.is_empty() {
        reply(
            &bot,
            &msg,
            format!("Usage: /{} <torrent_id> [torrent_id2 torrent_id3 ...]", action.command()),
        )
        .await?;
        return Ok(());
    }

    let mut names = Vec::new();
    let mut failures = 0;

    for arg in ids {
        match apply_action(&state, action, arg).await {
            Ok(name) => names.push(name),
            Err(e) => {
                failures += 1;
                reply(
                    &bot,
                    &msg,
                    format!("Failed to {} torrent {}: {}", action.verb(), arg, e),
                )
                .await?;
            }
        }
    }

    if let Some(summary) = summary_message(action, &names) {
        reply(&bot, &msg, summary).await?;
    } else if failures == 0 {
        reply(&bot, &msg, "No valid torrent IDs provided.").await?;
    }
    Ok(())
}

/// Apply one action; returns `"name (ID: id)"` on success.
async fn apply_action(state: &BotState, action: TorrentAction, arg: &str) -> Result<String, String> {
    let id = arg.parse::<TorrentId>().map_err(|e| e.to_string())?;
    let torrent = state.transmission.torrent(id).await.map_err(|e| e.to_string())?;
    let client = &state.transmission;

    let outcome = match action {
        TorrentAction::Start => client.start(id).await,
        TorrentAction::ForceStart => client.start_now(id).await,
        TorrentAction::Stop => client.stop(id).await,
        TorrentAction::Delete => client.remove(id, true).await,
    };
    outcome.map_err(|e| e.to_string())?;

    if action == TorrentAction::Delete {
        state.tracker.untrack(id).await;
    }
    info!(torrent_id = %id, action = action.command(), "torrent action applied");
    Ok(format!("{} (ID: {})", torrent.name, id))
}

/// Handle /movie and /tv.
pub async fn handle_move(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    library: Library,
    args: String,
) -> ResponseResult<()> {
    let Some(arg) = single_arg(&args) else {
        reply(&bot, &msg, library.usage()).await?;
        return Ok(());
    };

    let target = match library {
        Library::Movies => &state.config.movies_dir,
        Library::Tv => &state.config.tv_dir,
    };

    let moved = async {
        let id = arg.parse::<TorrentId>().map_err(|e| e.to_string())?;
        let torrent = state.transmission.torrent(id).await.map_err(|e| e.to_string())?;
        state
            .transmission
            .move_data(id, target)
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>(torrent.name)
    };

    let text = match moved.await {
        Ok(name) => format!("Torrent {} moved to {} directory.", name, library.label()),
        Err(e) => format!("Failed to move torrent {}: {}", arg, e),
    };
    reply(&bot, &msg, text).await?;
    Ok(())
}

/// Route a parsed command, after the authorization check.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !is_authorized(&msg, &state) {
        warn!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| u.id), "Unauthorized command");
        reply(&bot, &msg, "You are not authorized to use this bot.").await?;
        return Ok(());
    }

    match cmd {
        Command::Search(q) | Command::S(q) => handle_search(bot, msg, state, q).await,
        Command::Imdb(link) => handle_imdb(bot, msg, state, link).await,
        Command::Torrent(link) | Command::Magnet(link) | Command::Add(link) => {
            handle_add_link(bot, msg, state, link).await
        }
        Command::List | Command::Ls => handle_list(bot, msg, state).await,
        Command::Info(id) | Command::I(id) => handle_info(bot, msg, state, id).await,
        Command::Start(ids) => handle_action(bot, msg, state, TorrentAction::Start, ids).await,
        Command::ForceStart(ids) | Command::Fs(ids) => {
            handle_action(bot, msg, state, TorrentAction::ForceStart, ids).await
        }
        Command::Stop(ids) => handle_action(bot, msg, state, TorrentAction::Stop, ids).await,
        Command::Delete(ids) | Command::Del(ids) => {
            handle_action(bot, msg, state, TorrentAction::Delete, ids).await
        }
        Command::Movie(id) | Command::M(id) => handle_move(bot, msg, state, Library::Movies, id).await,
        Command::Tv(id) | Command::T(id) => handle_move(bot, msg, state, Library::Tv, id).await,
        Command::Help | Command::H => handle_help(bot, msg).await,
    }
}

/// Route a reply to a search results message, after the authorization check.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if !is_authorized(&msg, &state) {
        reply(&bot, &msg, "You are not authorized to use this bot.").await?;
        return Ok(());
    }
    handle_reply(bot, msg, state).await
}
