//! Search UI components
//!
//! Contains keyboards, text messages, and formatters for search results
//! and detail cards. All upstream text is HTML-escaped.

use crate::config::CAPTION_LIMIT;
use crate::media::{DetailCard, ResultEntry};
use html_escape::encode_text;
use reqwest::Url;
use std::time::Duration;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Trait definition
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for search UI view rendering
///
/// Provides all fixed text messages shown during a search interaction.
pub trait SearchView {
    /// Greeting for `/start`
    fn welcome_message() -> &'static str;

    /// Usage for `/help`
    fn help_message() -> &'static str;

    /// Query was empty after removing keywords
    fn empty_query() -> &'static str;

    /// Transient indicator while searching
    fn searching() -> &'static str;

    /// Transient indicator while loading a detail card
    fn loading_details() -> &'static str;

    /// Search upstream is unreachable
    fn search_busy() -> &'static str;

    /// Detail upstream is unreachable
    fn detail_failed() -> &'static str;

    /// Callback data is not a selection
    fn unknown_selection() -> &'static str;

    /// Slash command the bot does not register
    fn unknown_command() -> &'static str;
}

/// Default English implementation of [`SearchView`]
pub struct DefaultSearchView;

impl SearchView for DefaultSearchView {
    fn welcome_message() -> &'static str {
        "🍿 <b>Film Finder</b>\n\n\
         Send me the name of a movie or TV show and pick it from the list.\n\
         Add <i>movie</i> or <i>tv</i> to narrow the search, e.g. <code>dark tv</code>."
    }

    fn help_message() -> &'static str {
        "<b>How to search</b>\n\n\
         • <code>rrr movie</code> searches movies only\n\
         • <code>dark series</code> searches TV shows only\n\
         • <code>squid</code> searches everything\n\n\
         Words like <i>watch</i>, <i>download</i> and <i>link</i> are ignored.\n\n\
         /stats shows cache statistics."
    }

    fn empty_query() -> &'static str {
        "✏️ Please type a title to search for."
    }

    fn searching() -> &'static str {
        "🔎 Searching..."
    }

    fn loading_details() -> &'static str {
        "⏳ Loading details..."
    }

    fn search_busy() -> &'static str {
        "⚠️ The search service is busy right now. Please try again in a moment."
    }

    fn detail_failed() -> &'static str {
        "❌ Could not load details for this title. Please try again later."
    }

    fn unknown_selection() -> &'static str {
        "This button is no longer valid."
    }

    fn unknown_command() -> &'static str {
        "Unknown command. Send /help to see what I can do."
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatters
// ─────────────────────────────────────────────────────────────────────────────

/// Header above the results keyboard
#[must_use]
pub fn results_message(query: &str, count: usize) -> String {
    format!(
        "🎯 Found {count} result(s) for <b>{}</b>. Choose one:",
        encode_text(query)
    )
}

/// Text sent when nothing matched
#[must_use]
pub fn no_results_message(raw_input: &str) -> String {
    format!(
        "🤷 Nothing found for <b>{}</b>. Try a web search instead:",
        encode_text(raw_input)
    )
}

/// Cache statistics for `/stats`
#[must_use]
pub fn stats_message(entries: u64, ttl: Duration) -> String {
    format!(
        "📊 <b>Cache</b>\n\nEntries: {entries}\nTTL: {}s",
        ttl.as_secs()
    )
}

/// HTML caption for a detail card, kept within the Telegram caption limit
///
/// # Examples
///
/// ```
/// use filmfinder::bot::views::detail_caption;
/// use filmfinder::media::{DetailCard, MediaKind};
///
/// let card = DetailCard {
///     kind: MediaKind::Movie,
///     id: 1,
///     title: "Tom & Jerry".to_string(),
///     year: None,
///     rating: Some(6.0),
///     overview: None,
///     poster_url: None,
///     links: Vec::new(),
/// };
/// assert_eq!(
///     detail_caption(&card),
///     "🎬 <b>Tom &amp; Jerry</b> (N/A)\n⭐ 6.0/10"
/// );
/// ```
#[must_use]
pub fn detail_caption(card: &DetailCard) -> String {
    let header = format!(
        "{} <b>{}</b> ({})\n⭐ {}",
        card.kind.glyph(),
        encode_text(&card.title),
        card.year.as_deref().unwrap_or("N/A"),
        card.rating_label()
    );

    let Some(overview) = card.overview.as_deref() else {
        return header;
    };
    let full = format!("{header}\n\n{}", encode_text(overview));
    if full.chars().count() <= CAPTION_LIMIT {
        return full;
    }

    // Room left after the header, the blank line and the ellipsis
    let budget = CAPTION_LIMIT
        .saturating_sub(header.chars().count())
        .saturating_sub(3);
    let clipped = escape_within(overview, budget);
    if clipped.is_empty() {
        header
    } else {
        format!("{header}\n\n{clipped}…")
    }
}

/// Escapes `raw` char by char, stopping before an entity would cross `budget`
fn escape_within(raw: &str, budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    let mut buf = [0u8; 4];
    for ch in raw.chars() {
        let piece: &str = ch.encode_utf8(&mut buf);
        let escaped = encode_text(piece);
        let width = escaped.chars().count();
        if used + width > budget {
            break;
        }
        out.push_str(&escaped);
        used += width;
    }
    out.trim_end().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// One button per search match, carrying its selection token
#[must_use]
pub fn results_keyboard(entries: &[ResultEntry]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(entries.iter().map(|entry| {
        vec![InlineKeyboardButton::callback(
            entry.label(),
            entry.token().to_string(),
        )]
    }))
}

/// Single button opening the web search
#[must_use]
pub fn web_search_keyboard(url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(url_button("🌐 Search the web", url).map(|b| vec![b]))
}

/// Watch and download buttons for a detail card
#[must_use]
pub fn detail_keyboard(card: &DetailCard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        card.links
            .iter()
            .filter_map(|link| url_button(link.label, &link.url))
            .map(|b| vec![b]),
    )
}

fn url_button(label: &str, url: &str) -> Option<InlineKeyboardButton> {
    match Url::parse(url) {
        Ok(url) => Some(InlineKeyboardButton::url(label.to_string(), url)),
        Err(e) => {
            warn!("Skipping button '{label}' with invalid URL: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaKind, OutboundLink};
    use teloxide::types::InlineKeyboardButtonKind;

    fn card() -> DetailCard {
        DetailCard {
            kind: MediaKind::Tv,
            id: 1396,
            title: "Breaking Bad".to_string(),
            year: Some("2008".to_string()),
            rating: Some(8.9),
            overview: Some("A chemistry tutor <turns> to crime.".to_string()),
            poster_url: None,
            links: vec![
                OutboundLink {
                    label: "▶️ Watch (mirror 1)",
                    url: "https://a.test/tv/1396".to_string(),
                },
                OutboundLink {
                    label: "broken",
                    url: "not a url".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_results_keyboard_one_row_per_entry() {
        let entries = vec![
            ResultEntry {
                id: 603,
                title: "The Matrix".to_string(),
                kind: MediaKind::Movie,
                year: Some("1999".to_string()),
            },
            ResultEntry {
                id: 1396,
                title: "Breaking Bad".to_string(),
                kind: MediaKind::Tv,
                year: None,
            },
        ];
        let keyboard = results_keyboard(&entries);

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        let first = &keyboard.inline_keyboard[0][0];
        assert_eq!(first.text, "🎬 The Matrix (1999)");
        assert!(matches!(
            &first.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "select_movie_603"
        ));
    }

    #[test]
    fn test_detail_keyboard_skips_invalid_urls() {
        let keyboard = detail_keyboard(&card());
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "▶️ Watch (mirror 1)");
    }

    #[test]
    fn test_detail_caption_escapes_overview() {
        let caption = detail_caption(&card());
        assert!(caption.contains("📺 <b>Breaking Bad</b> (2008)"));
        assert!(caption.contains("⭐ 8.9/10"));
        assert!(caption.contains("&lt;turns&gt;"));
    }

    #[test]
    fn test_detail_caption_clips_overview_over_limit() {
        let mut card = card();
        card.overview = Some("x".repeat(CAPTION_LIMIT));
        let caption = detail_caption(&card);
        assert!(caption.contains("xxx"));
        assert!(caption.ends_with('…'));
        assert_eq!(caption.chars().count(), CAPTION_LIMIT);
    }

    #[test]
    fn test_detail_caption_never_splits_an_entity() {
        let mut card = card();
        let raw = "a&".repeat(CAPTION_LIMIT);
        card.overview = Some(raw.clone());
        let caption = detail_caption(&card);
        assert!(caption.chars().count() <= CAPTION_LIMIT);

        let body = caption
            .split_once("\n\n")
            .map(|(_, body)| body)
            .expect("overview kept")
            .trim_end_matches('…');
        assert!(body.ends_with("&amp;") || body.ends_with('a'));
        assert!(raw.starts_with(&*html_escape::decode_html_entities(body)));
    }

    #[test]
    fn test_web_search_keyboard() {
        let keyboard = web_search_keyboard("https://www.google.com/search?q=rrr");
        assert_eq!(keyboard.inline_keyboard.len(), 1);
    }
}
