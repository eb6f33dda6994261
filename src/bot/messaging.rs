//! Best-effort Telegram calls whose failure never reaches the user.

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, Message, MessageId, ParseMode};
use tracing::debug;

/// Sends a transient status message such as "Searching..."
///
/// Returns `None` if sending failed; the interaction continues without it.
pub async fn send_loading_indicator(bot: &Bot, chat_id: ChatId, text: &str) -> Option<Message> {
    match bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!("Loading indicator not sent to chat {}: {e}", chat_id.0);
            None
        }
    }
}

/// Deletes a transient status message, ignoring failures
pub async fn delete_loading_indicator(bot: &Bot, chat_id: ChatId, msg_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, msg_id).await {
        debug!(
            "Loading indicator {} in chat {} not deleted: {e}",
            msg_id.0, chat_id.0
        );
    }
}

/// Answers a callback query so the client stops its spinner, ignoring failures
pub async fn answer_callback_quietly(bot: &Bot, query: &CallbackQuery, text: Option<&str>) {
    let mut req = bot.answer_callback_query(query.id.clone());
    if let Some(text) = text {
        req = req.text(text);
    }
    if let Err(e) = req.await {
        debug!("Callback query not answered: {e}");
    }
}
