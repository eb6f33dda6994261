//! Detail card lookup for a selection token.

use super::tmdb::Details;
use super::{year_of, MediaKind, SelectionToken, TmdbApi};
use crate::cache::{FetchCache, FetchError};
use crate::config::{Settings, OVERVIEW_LIMIT};
use crate::utils::truncate_str;
use std::sync::Arc;
use tracing::{info, warn};

/// A labelled external link on a detail card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLink {
    /// Button text
    pub label: &'static str,
    /// Absolute URL
    pub url: String,
}

/// Everything shown for a selected title
#[derive(Debug, Clone, PartialEq)]
pub struct DetailCard {
    /// Media kind
    pub kind: MediaKind,
    /// TMDB identifier
    pub id: u64,
    /// Title or series name
    pub title: String,
    /// Four-digit year, if known
    pub year: Option<String>,
    /// Average rating out of 10, if known
    pub rating: Option<f64>,
    /// Synopsis, truncated
    pub overview: Option<String>,
    /// Absolute poster URL, if the title has one
    pub poster_url: Option<String>,
    /// Two watch mirrors followed by the download link
    pub links: Vec<OutboundLink>,
}

impl DetailCard {
    /// Rating with one decimal, or `N/A`
    ///
    /// # Examples
    ///
    /// ```
    /// use filmfinder::media::{DetailCard, MediaKind};
    ///
    /// let mut card = DetailCard {
    ///     kind: MediaKind::Movie,
    ///     id: 603,
    ///     title: "The Matrix".to_string(),
    ///     year: Some("1999".to_string()),
    ///     rating: Some(8.216),
    ///     overview: None,
    ///     poster_url: None,
    ///     links: Vec::new(),
    /// };
    /// assert_eq!(card.rating_label(), "8.2/10");
    /// card.rating = None;
    /// assert_eq!(card.rating_label(), "N/A");
    /// ```
    #[must_use]
    pub fn rating_label(&self) -> String {
        self.rating
            .map_or_else(|| "N/A".to_string(), |r| format!("{r:.1}/10"))
    }
}

const LINK_LABELS: [&str; 3] = ["▶️ Watch (mirror 1)", "▶️ Watch (mirror 2)", "⬇️ Download"];

/// Resolves selection tokens into detail cards
pub struct DetailOrchestrator {
    cache: Arc<FetchCache>,
    api: TmdbApi,
    link_templates: [String; 3],
}

impl DetailOrchestrator {
    /// Creates an orchestrator sharing `cache`
    ///
    /// `link_templates` are the two watch mirrors then the download link;
    /// `{kind}` and `{id}` are substituted.
    #[must_use]
    pub const fn new(cache: Arc<FetchCache>, api: TmdbApi, link_templates: [String; 3]) -> Self {
        Self {
            cache,
            api,
            link_templates,
        }
    }

    /// Builds from loaded settings
    #[must_use]
    pub fn from_settings(cache: Arc<FetchCache>, settings: &Settings) -> Self {
        Self::new(
            cache,
            TmdbApi::from_settings(settings),
            settings.link_templates().map(str::to_string),
        )
    }

    /// URL the token resolves to
    #[must_use]
    pub fn detail_url(&self, token: SelectionToken) -> String {
        self.api.detail_url(token.kind, token.id)
    }

    /// Fetches and formats the detail card for `token`
    ///
    /// # Errors
    ///
    /// Returns the fetch error when neither the direct nor the proxied
    /// request succeeds.
    pub async fn load(&self, token: SelectionToken) -> Result<DetailCard, FetchError> {
        let payload = self
            .cache
            .fetch(&self.detail_url(token))
            .await
            .inspect_err(|e| warn!("Detail lookup for {token} failed: {e}"))?;

        let details = Details::from_payload(&payload);
        info!("Loaded details for {token}");

        Ok(DetailCard {
            kind: token.kind,
            id: token.id,
            title: details.display_title().unwrap_or("Untitled").to_string(),
            year: year_of(details.date()),
            rating: details.vote_average,
            overview: details
                .overview
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(truncate_overview),
            poster_url: details
                .poster_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| self.api.poster_url(p)),
            links: self.links(token),
        })
    }

    fn links(&self, token: SelectionToken) -> Vec<OutboundLink> {
        LINK_LABELS
            .into_iter()
            .zip(&self.link_templates)
            .map(|(label, template)| OutboundLink {
                label,
                url: fill_template(template, token),
            })
            .collect()
    }
}

fn truncate_overview(overview: &str) -> String {
    if overview.chars().count() > OVERVIEW_LIMIT {
        format!("{}…", truncate_str(overview, OVERVIEW_LIMIT))
    } else {
        overview.to_string()
    }
}

fn fill_template(template: &str, token: SelectionToken) -> String {
    template
        .replace("{kind}", token.kind.as_str())
        .replace("{id}", &token.id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        let token = SelectionToken::new(MediaKind::Tv, 1396);
        assert_eq!(
            fill_template("https://x.test/{kind}/{id}?ref={kind}", token),
            "https://x.test/tv/1396?ref=tv"
        );
    }

    #[test]
    fn test_truncate_overview() {
        let long = "a".repeat(OVERVIEW_LIMIT + 10);
        let truncated = truncate_overview(&long);
        assert_eq!(truncated.chars().count(), OVERVIEW_LIMIT + 1);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_overview("short"), "short");
    }
}
