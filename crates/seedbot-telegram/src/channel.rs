//! Telegram as the tracker's notification channel.

use async_trait::async_trait;
use seedbot_models::{DestinationId, MessageRef};
use seedbot_tracker::{DeliveryError, NotificationChannel};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};

/// Sends and edits progress messages through the Bot API.
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Telegram rejects edits that would not change the text; that is not a
/// delivery failure. Flood control and network errors leave the message
/// in place for a later tick.
pub fn delivery_error(e: RequestError) -> DeliveryError {
    match e {
        RequestError::Api(ApiError::MessageNotModified) => DeliveryError::Unchanged,
        e @ (RequestError::RetryAfter(_) | RequestError::Network(_) | RequestError::Io(_)) => {
            DeliveryError::Transient(e.to_string())
        }
        other => DeliveryError::Failed(other.to_string()),
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, destination: DestinationId, text: &str) -> Result<MessageRef, DeliveryError> {
        let sent = self
            .bot
            .send_message(ChatId(destination), text)
            .await
            .map_err(delivery_error)?;
        Ok(sent.id.0)
    }

    async fn edit(
        &self,
        destination: DestinationId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.bot
            .edit_message_text(ChatId(destination), MessageId(message), text)
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }

    async fn delete(&self, destination: DestinationId, message: MessageRef) -> Result<(), DeliveryError> {
        self.bot
            .delete_message(ChatId(destination), MessageId(message))
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::Seconds;

    #[test]
    fn test_not_modified_is_unchanged() {
        assert_eq!(
            delivery_error(RequestError::Api(ApiError::MessageNotModified)),
            DeliveryError::Unchanged
        );
    }

    #[test]
    fn test_flood_control_is_transient() {
        let err = delivery_error(RequestError::RetryAfter(Seconds::from_seconds(5)));
        assert!(matches!(err, DeliveryError::Transient(_)));
    }

    #[test]
    fn test_other_api_errors_fail() {
        assert!(matches!(
            delivery_error(RequestError::Api(ApiError::MessageToEditNotFound)),
            DeliveryError::Failed(_)
        ));
        assert!(matches!(
            delivery_error(RequestError::Api(ApiError::BotBlocked)),
            DeliveryError::Failed(_)
        ));
    }
}
