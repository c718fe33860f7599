//! Main Telegram bot implementation.

use std::sync::Arc;

use seedbot_core::BotConfig;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::error::{BotError, Result};
use crate::handlers::{handle_command, handle_message, Command};
use crate::state::BotState;

/// The Seedbot Telegram bot.
pub struct SeedBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl SeedBot {
    /// Create the bot, waiting for Transmission to become reachable.
    pub async fn new(config: BotConfig) -> Result<Self> {
        let bot = Bot::new(config.telegram_token.clone());
        let state = BotState::connect(config, bot.clone()).await?;

        Ok(Self {
            bot,
            state: Arc::new(state),
        })
    }

    /// Create a bot around existing state.
    pub fn with_state(bot: Bot, state: Arc<BotState>) -> Self {
        Self { bot, state }
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run the long-polling dispatcher until Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        let bot = self.bot.clone();
        let state_for_commands = Arc::clone(&self.state);
        let state_for_replies = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text().is_some_and(|t| t.starts_with('/'))
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            info!(cmd = %text, "Unrecognized command");
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.reply_to_message().is_some()
                            && msg.text().is_some_and(|t| !t.starts_with('/'))
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_replies);
                        info!(chat_id = %msg.chat.id, text = ?msg.text(), "Reply received");
                        async move { handle_message(bot, msg, state).await }
                    }),
            );

        info!("Bot is running! Send /help to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                tracing::trace!("Unhandled update: {:?}", upd.id);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error from the update listener",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        warn!("Dispatcher stopped");
        Ok(())
    }
}
