//! TMDB endpoints and the narrow slice of their payloads we consume.
//!
//! Every field is optional and decoded on its own: a mistyped field degrades
//! to "unknown" without taking its neighbours down with it.

use super::{MediaKind, SearchEndpoint};
use crate::config::Settings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// URL builder for the TMDB v3 API
#[derive(Debug, Clone)]
pub struct TmdbApi {
    base: String,
    api_key: String,
    image_base: String,
}

impl TmdbApi {
    /// Creates a builder; trailing slashes on the bases are ignored
    #[must_use]
    pub fn new(base: &str, api_key: &str, image_base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
        }
    }

    /// Builds from loaded settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.tmdb_api_base,
            &settings.tmdb_api_key,
            &settings.tmdb_image_base,
        )
    }

    /// `GET /search/{endpoint}?query=..&api_key=..`
    ///
    /// # Examples
    ///
    /// ```
    /// use filmfinder::media::{SearchEndpoint, TmdbApi};
    ///
    /// let api = TmdbApi::new("https://api.test/3", "k", "https://img.test");
    /// assert_eq!(
    ///     api.search_url(SearchEndpoint::Tv, "breaking bad"),
    ///     "https://api.test/3/search/tv?query=breaking%20bad&api_key=k"
    /// );
    /// ```
    #[must_use]
    pub fn search_url(&self, endpoint: SearchEndpoint, query: &str) -> String {
        format!(
            "{}/search/{}?query={}&api_key={}",
            self.base,
            endpoint.as_str(),
            urlencoding::encode(query),
            self.api_key
        )
    }

    /// `GET /{kind}/{id}?api_key=..`
    #[must_use]
    pub fn detail_url(&self, kind: MediaKind, id: u64) -> String {
        format!("{}/{}/{}?api_key={}", self.base, kind, id, self.api_key)
    }

    /// Absolute poster URL for a TMDB `poster_path`
    #[must_use]
    pub fn poster_url(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_base, poster_path.trim_start_matches('/'))
    }
}

/// One element of a search `results` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    /// TMDB identifier
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    /// Present on `/search/multi` only
    #[serde(default, deserialize_with = "lenient")]
    pub media_type: Option<String>,
    /// Movie title
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// TV series name
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Movie release date (`YYYY-MM-DD`)
    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<String>,
    /// TV first air date (`YYYY-MM-DD`)
    #[serde(default, deserialize_with = "lenient")]
    pub first_air_date: Option<String>,
}

impl SearchItem {
    /// Title for movies, name for series
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    /// Release date for movies, first air date for series
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        non_empty(self.release_date.as_deref())
            .or_else(|| non_empty(self.first_air_date.as_deref()))
    }
}

/// Items of a search response; entries that are not objects are skipped
#[must_use]
pub fn search_items(payload: &Value) -> Vec<SearchItem> {
    payload
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|item| SearchItem::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Detail response for a single movie or series
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Details {
    /// Movie title
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// TV series name
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Movie release date
    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<String>,
    /// TV first air date
    #[serde(default, deserialize_with = "lenient")]
    pub first_air_date: Option<String>,
    /// Average user rating out of 10
    #[serde(default, deserialize_with = "lenient")]
    pub vote_average: Option<f64>,
    /// Synopsis
    #[serde(default, deserialize_with = "lenient")]
    pub overview: Option<String>,
    /// Relative poster path, e.g. `/abc.jpg`
    #[serde(default, deserialize_with = "lenient")]
    pub poster_path: Option<String>,
}

impl Details {
    /// Decodes a detail payload field by field; a non-object payload yields all unknowns
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        Self::deserialize(payload).unwrap_or_default()
    }

    /// Title for movies, name for series
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    /// Release date for movies, first air date for series
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        non_empty(self.release_date.as_deref())
            .or_else(|| non_empty(self.first_air_date.as_deref()))
    }
}

/// A present but mistyped field reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
