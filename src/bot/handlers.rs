use crate::bot::messaging::{
    answer_callback_quietly, delete_loading_indicator, send_loading_indicator,
};
use crate::bot::resilient::{send_message_resilient, send_photo_resilient};
use crate::bot::views::{
    detail_caption, detail_keyboard, no_results_message, results_keyboard, results_message,
    stats_message, web_search_keyboard, DefaultSearchView, SearchView,
};
use crate::cache::FetchCache;
use crate::media::{
    classify, DetailCard, DetailOrchestrator, SearchOrchestrator, SearchOutcome, SelectionToken,
};
use anyhow::{anyhow, Result};
use reqwest::Url;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, ParseMode},
    utils::command::BotCommands,
};
use tracing::{info, warn};

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Show search usage
    #[command(description = "How to search.")]
    Help,
    /// Show cache statistics
    #[command(description = "Show cache statistics.")]
    Stats,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!("User {} initiated /start command.", get_user_id_safe(&msg));
    send_message_resilient(
        &bot,
        msg.chat.id,
        DefaultSearchView::welcome_message(),
        Some(ParseMode::Html),
        None,
    )
    .await?;
    Ok(())
}

/// Help handler
///
/// # Errors
///
/// Returns an error if the help message cannot be sent.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    send_message_resilient(
        &bot,
        msg.chat.id,
        DefaultSearchView::help_message(),
        Some(ParseMode::Html),
        None,
    )
    .await?;
    Ok(())
}

/// True for slash commands, which are never searched as titles
#[must_use]
pub fn is_command_text(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Replies to a slash command no branch recognised
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn unknown_command(bot: Bot, msg: Message) -> Result<()> {
    info!(
        "User {} sent unknown command {:?}",
        get_user_id_safe(&msg),
        msg.text().unwrap_or_default()
    );
    send_plain(&bot, msg.chat.id, DefaultSearchView::unknown_command()).await
}

/// Stats handler
///
/// # Errors
///
/// Returns an error if the statistics message cannot be sent.
pub async fn stats(bot: Bot, msg: Message, cache: Arc<FetchCache>) -> Result<()> {
    let text = stats_message(cache.entry_count().await, cache.ttl());
    send_message_resilient(&bot, msg.chat.id, text, Some(ParseMode::Html), None).await?;
    Ok(())
}

/// Handles a free-text title search
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn handle_text(bot: Bot, msg: Message, search: Arc<SearchOrchestrator>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if is_command_text(text) {
        return unknown_command(bot, msg).await;
    }
    let chat_id = msg.chat.id;
    let classified = classify(text);

    info!(
        "User {} searching '{}' ({})",
        get_user_id_safe(&msg),
        classified.query,
        classified.endpoint.as_str()
    );

    if classified.is_empty() {
        send_plain(&bot, chat_id, DefaultSearchView::empty_query()).await?;
        return Ok(());
    }

    let loading = send_loading_indicator(&bot, chat_id, DefaultSearchView::searching()).await;
    let outcome = search.search_classified(&classified, text).await;
    if let Some(loading) = loading {
        delete_loading_indicator(&bot, chat_id, loading.id).await;
    }

    match outcome {
        SearchOutcome::EmptyQuery => {
            send_plain(&bot, chat_id, DefaultSearchView::empty_query()).await?;
        }
        SearchOutcome::Unavailable(_) => {
            send_plain(&bot, chat_id, DefaultSearchView::search_busy()).await?;
        }
        SearchOutcome::NoResults { web_search_url } => {
            send_message_resilient(
                &bot,
                chat_id,
                no_results_message(text),
                Some(ParseMode::Html),
                Some(web_search_keyboard(&web_search_url)),
            )
            .await?;
        }
        SearchOutcome::Results(entries) => {
            send_message_resilient(
                &bot,
                chat_id,
                results_message(&classified.query, entries.len()),
                Some(ParseMode::Html),
                Some(results_keyboard(&entries)),
            )
            .await?;
        }
    }
    Ok(())
}

/// Handles a press on a search result button
///
/// # Errors
///
/// Returns an error if the callback has no chat or the reply cannot be delivered.
pub async fn handle_selection(
    bot: Bot,
    q: CallbackQuery,
    details: Arc<DetailOrchestrator>,
) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let token = match data.parse::<SelectionToken>() {
        Ok(token) => token,
        Err(e) => {
            warn!("Ignoring callback from user {}: {e}", q.from.id.0);
            answer_callback_quietly(&bot, &q, Some(DefaultSearchView::unknown_selection())).await;
            return Ok(());
        }
    };
    answer_callback_quietly(&bot, &q, None).await;

    let chat_id = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .ok_or_else(|| anyhow!("Callback message missing chat id"))?;

    info!("User {} selected {token}", q.from.id.0);

    let loading = send_loading_indicator(&bot, chat_id, DefaultSearchView::loading_details()).await;
    let card = details.load(token).await;
    if let Some(loading) = loading {
        delete_loading_indicator(&bot, chat_id, loading.id).await;
    }

    match card {
        Ok(card) => send_detail_card(&bot, chat_id, &card).await,
        Err(_) => send_plain(&bot, chat_id, DefaultSearchView::detail_failed()).await,
    }
}

async fn send_detail_card(bot: &Bot, chat_id: ChatId, card: &DetailCard) -> Result<()> {
    let caption = detail_caption(card);
    let keyboard = detail_keyboard(card);

    if let Some(poster) = card.poster_url.as_deref().and_then(|p| Url::parse(p).ok()) {
        match send_photo_resilient(bot, chat_id, poster, caption.clone(), keyboard.clone()).await {
            Ok(_) => return Ok(()),
            // Telegram rejects some posters it cannot fetch; fall back to text
            Err(e) => warn!("Poster not sent for {}/{}: {e}", card.kind, card.id),
        }
    }

    send_message_resilient(bot, chat_id, caption, Some(ParseMode::Html), Some(keyboard)).await?;
    Ok(())
}

async fn send_plain(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    send_message_resilient(bot, chat_id, text, Some(ParseMode::Html), None).await?;
    Ok(())
}
