//! Title search through the fetch cache.

use super::tmdb::{search_items, SearchItem};
use super::{classify, year_of, ClassifiedQuery, MediaKind, SelectionToken, TmdbApi};
use crate::cache::{FetchCache, FetchError};
use crate::config::{MAX_SEARCH_RESULTS, WEB_SEARCH_BASE};
use std::sync::Arc;
use tracing::{info, warn};

/// A selectable search match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// TMDB identifier
    pub id: u64,
    /// Movie title or series name
    pub title: String,
    /// Media kind
    pub kind: MediaKind,
    /// Four-digit year, if known
    pub year: Option<String>,
}

impl ResultEntry {
    /// Button label: glyph, title and year
    ///
    /// # Examples
    ///
    /// ```
    /// use filmfinder::media::{MediaKind, ResultEntry};
    ///
    /// let entry = ResultEntry {
    ///     id: 603,
    ///     title: "The Matrix".to_string(),
    ///     kind: MediaKind::Movie,
    ///     year: None,
    /// };
    /// assert_eq!(entry.label(), "🎬 The Matrix (N/A)");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {} ({})",
            self.kind.glyph(),
            self.title,
            self.year.as_deref().unwrap_or("N/A")
        )
    }

    /// Token sent back when this entry is chosen
    #[must_use]
    pub const fn token(&self) -> SelectionToken {
        SelectionToken::new(self.kind, self.id)
    }
}

/// Result of a search request
#[derive(Debug)]
pub enum SearchOutcome {
    /// Nothing left to search after removing hint keywords
    EmptyQuery,
    /// Upstream could not be reached, even through the proxy
    Unavailable(FetchError),
    /// No media matched; offer a web search instead
    NoResults {
        /// Web search for the raw input
        web_search_url: String,
    },
    /// Matches, at most [`MAX_SEARCH_RESULTS`]
    Results(Vec<ResultEntry>),
}

/// Runs title searches
pub struct SearchOrchestrator {
    cache: Arc<FetchCache>,
    api: TmdbApi,
}

impl SearchOrchestrator {
    /// Creates an orchestrator sharing `cache`
    #[must_use]
    pub const fn new(cache: Arc<FetchCache>, api: TmdbApi) -> Self {
        Self { cache, api }
    }

    /// Classifies `raw_input` and searches for it
    pub async fn search(&self, raw_input: &str) -> SearchOutcome {
        let classified = classify(raw_input);
        self.search_classified(&classified, raw_input).await
    }

    /// Searches an already classified query
    ///
    /// `raw_input` is only used to build the web search fallback.
    pub async fn search_classified(
        &self,
        classified: &ClassifiedQuery,
        raw_input: &str,
    ) -> SearchOutcome {
        if classified.is_empty() {
            return SearchOutcome::EmptyQuery;
        }

        let url = self.api.search_url(classified.endpoint, &classified.query);
        let payload = match self.cache.fetch(&url).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "Search for '{}' ({}) failed: {e}",
                    classified.query,
                    classified.endpoint.as_str()
                );
                return SearchOutcome::Unavailable(e);
            }
        };

        let implied = classified.endpoint.implied_kind();
        let entries: Vec<ResultEntry> = search_items(&payload)
            .iter()
            .filter_map(|item| to_entry(item, implied))
            .take(MAX_SEARCH_RESULTS)
            .collect();

        info!(
            "Search '{}' ({}) -> {} entries",
            classified.query,
            classified.endpoint.as_str(),
            entries.len()
        );

        if entries.is_empty() {
            SearchOutcome::NoResults {
                web_search_url: web_search_url(raw_input),
            }
        } else {
            SearchOutcome::Results(entries)
        }
    }
}

/// Web search link for input TMDB could not match
///
/// # Examples
///
/// ```
/// use filmfinder::media::search::web_search_url;
///
/// assert_eq!(
///     web_search_url("obscure film"),
///     "https://www.google.com/search?q=obscure%20film"
/// );
/// ```
#[must_use]
pub fn web_search_url(raw_input: &str) -> String {
    format!("{WEB_SEARCH_BASE}{}", urlencoding::encode(raw_input))
}

fn to_entry(item: &SearchItem, implied: Option<MediaKind>) -> Option<ResultEntry> {
    let kind = match item.media_type.as_deref() {
        Some(media_type) => MediaKind::from_tmdb(media_type)?,
        None => implied?,
    };
    Some(ResultEntry {
        id: item.id?,
        title: item.display_title().unwrap_or("Untitled").to_string(),
        kind,
        year: year_of(item.date()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: Option<u64>, media_type: Option<&str>) -> SearchItem {
        SearchItem {
            id,
            media_type: media_type.map(str::to_string),
            title: Some("Title".to_string()),
            ..SearchItem::default()
        }
    }

    #[test]
    fn test_entry_kind_from_media_type() {
        let entry = to_entry(&item(Some(1), Some("tv")), Some(MediaKind::Movie));
        assert_eq!(entry.map(|e| e.kind), Some(MediaKind::Tv));
    }

    #[test]
    fn test_entry_kind_from_endpoint() {
        let entry = to_entry(&item(Some(1), None), Some(MediaKind::Movie));
        assert_eq!(entry.map(|e| e.kind), Some(MediaKind::Movie));
    }

    #[test]
    fn test_non_media_dropped() {
        assert!(to_entry(&item(Some(1), Some("person")), None).is_none());
        assert!(to_entry(&item(Some(1), None), None).is_none());
        assert!(to_entry(&item(None, Some("movie")), None).is_none());
    }

    #[test]
    fn test_label_with_year() {
        let entry = ResultEntry {
            id: 1396,
            title: "Breaking Bad".to_string(),
            kind: MediaKind::Tv,
            year: Some("2008".to_string()),
        };
        assert_eq!(entry.label(), "📺 Breaking Bad (2008)");
        assert_eq!(entry.token().to_string(), "select_tv_1396");
    }
}
