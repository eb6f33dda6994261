//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! These wrappers retry on transient network failures using exponential
//! backoff with jitter. Delivery is at-least-once at best: a send that
//! reached Telegram but timed out locally may be repeated.
//!
//! # Usage
//!
//! ```ignore
//! use filmfinder::bot::resilient::send_message_resilient;
//!
//! let msg = send_message_resilient(&bot, chat_id, "Hello!", Some(ParseMode::Html), None).await?;
//! ```

use anyhow::Result;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, InputFile, Message, ParseMode};

/// Send a message with automatic retry on network failures.
///
/// # Arguments
///
/// * `bot` - The Telegram bot instance
/// * `chat_id` - Target chat ID
/// * `text` - Message text to send
/// * `parse_mode` - Optional parse mode (HTML, Markdown, etc.)
/// * `keyboard` - Optional inline keyboard attached to the message
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    parse_mode: Option<ParseMode>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = text.into();
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        if let Some(kb) = keyboard.clone() {
            req = req.reply_markup(kb);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Send a photo by URL with an HTML caption, retrying on network failures.
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_photo_resilient(
    bot: &Bot,
    chat_id: ChatId,
    photo: Url,
    caption: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
) -> Result<Message> {
    let caption = caption.into();
    crate::utils::retry_telegram_operation(|| async {
        bot.send_photo(chat_id, InputFile::url(photo.clone()))
            .caption(caption.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram photo error: {e}"))
    })
    .await
}
