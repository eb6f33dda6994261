//! Picks a search endpoint from keyword hints and strips them from the query.

use super::SearchEndpoint;
use lazy_regex::lazy_regex;

static RE_MOVIE_HINT: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)\b(?:movie|film)\b");
static RE_TV_HINT: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)\b(?:tv|series|show)\b");
static RE_NOISE_WORDS: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)\b(?:movie|film|tv|series|show|link|watch|download)\b");

/// Query text ready to send upstream plus the endpoint to send it to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedQuery {
    /// Input with hint keywords removed and whitespace collapsed
    pub query: String,
    /// Target search endpoint
    pub endpoint: SearchEndpoint,
}

impl ClassifiedQuery {
    /// Nothing left to search for after cleaning
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Classifies free text
///
/// A movie hint without a tv hint selects the movie endpoint and vice versa;
/// both or neither fall back to the multi endpoint.
///
/// # Examples
///
/// ```
/// use filmfinder::media::{classify, SearchEndpoint};
///
/// let q = classify("watch breaking bad show");
/// assert_eq!(q.endpoint, SearchEndpoint::Tv);
/// assert_eq!(q.query, "breaking bad");
/// ```
#[must_use]
pub fn classify(text: &str) -> ClassifiedQuery {
    let movie = RE_MOVIE_HINT.is_match(text);
    let tv = RE_TV_HINT.is_match(text);

    let endpoint = match (movie, tv) {
        (true, false) => SearchEndpoint::Movie,
        (false, true) => SearchEndpoint::Tv,
        _ => SearchEndpoint::Multi,
    };

    let stripped = RE_NOISE_WORDS.replace_all(text, " ");
    let query = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    ClassifiedQuery { query, endpoint }
}
