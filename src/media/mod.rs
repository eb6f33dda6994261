//! Media lookups against TMDB
//!
//! Free text is classified into a search endpoint, searched through the
//! fetch cache and turned into selectable entries; a selection token is
//! resolved into a detail card.

/// Keyword-based endpoint selection and query cleaning
pub mod classifier;
/// Detail card lookup
pub mod detail;
/// Title search
pub mod search;
/// TMDB URLs and typed payload views
pub mod tmdb;
/// `select_<kind>_<id>` wire format
pub mod token;

pub use classifier::{classify, ClassifiedQuery};
pub use detail::{DetailCard, DetailOrchestrator, OutboundLink};
pub use search::{ResultEntry, SearchOrchestrator, SearchOutcome};
pub use tmdb::TmdbApi;
pub use token::{SelectionToken, TokenError};

use std::fmt;

/// A concrete media type with its own detail endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Feature film
    Movie,
    /// Television series
    Tv,
}

impl MediaKind {
    /// Path segment used by TMDB and in selection tokens
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Glyph shown in front of result labels
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Movie => "🎬",
            Self::Tv => "📺",
        }
    }

    /// Parses a TMDB `media_type` value; anything else is not media
    #[must_use]
    pub fn from_tmdb(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which search endpoint a query is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEndpoint {
    /// `/search/movie`
    Movie,
    /// `/search/tv`
    Tv,
    /// `/search/multi`, across all media types
    Multi,
}

impl SearchEndpoint {
    /// Path segment after `/search/`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Multi => "multi",
        }
    }

    /// Media kind implied by the endpoint, if it searches a single kind
    #[must_use]
    pub const fn implied_kind(self) -> Option<MediaKind> {
        match self {
            Self::Movie => Some(MediaKind::Movie),
            Self::Tv => Some(MediaKind::Tv),
            Self::Multi => None,
        }
    }
}

/// First four characters of a TMDB date if they form a year
///
/// # Examples
///
/// ```
/// use filmfinder::media::year_of;
///
/// assert_eq!(year_of(Some("1999-03-31")), Some("1999".to_string()));
/// assert_eq!(year_of(Some("")), None);
/// assert_eq!(year_of(None), None);
/// ```
#[must_use]
pub fn year_of(date: Option<&str>) -> Option<String> {
    let year = date?.get(..4)?;
    year.chars()
        .all(|c| c.is_ascii_digit())
        .then(|| year.to_string())
}
