//! Selection tokens carried in inline button callback data.
//!
//! The token holds everything needed to show a detail card, so no
//! conversation state is kept between the search and the selection.

use super::MediaKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "select_";

/// Reasons callback data is not a selection token
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Does not start with `select_`
    #[error("not a selection token: {0}")]
    NotASelection(String),
    /// Kind is neither `movie` nor `tv`
    #[error("unknown media kind: {0}")]
    UnknownKind(String),
    /// Identifier is missing or not numeric
    #[error("invalid id: {0}")]
    InvalidId(String),
}

/// A chosen search result: `select_<kind>_<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken {
    /// Media kind of the selection
    pub kind: MediaKind,
    /// TMDB identifier
    pub id: u64,
}

impl SelectionToken {
    /// Creates a token
    #[must_use]
    pub const fn new(kind: MediaKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}_{}", self.kind, self.id)
    }
}

impl FromStr for SelectionToken {
    type Err = TokenError;

    /// # Examples
    ///
    /// ```
    /// use filmfinder::media::{MediaKind, SelectionToken};
    ///
    /// let token: SelectionToken = "select_movie_603".parse().unwrap();
    /// assert_eq!(token, SelectionToken::new(MediaKind::Movie, 603));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| TokenError::NotASelection(s.to_string()))?;
        let (kind, id) = rest
            .split_once('_')
            .ok_or_else(|| TokenError::InvalidId(rest.to_string()))?;
        let kind =
            MediaKind::from_tmdb(kind).ok_or_else(|| TokenError::UnknownKind(kind.to_string()))?;
        Ok(Self {
            kind,
            id: parse_id(id)?,
        })
    }
}

/// Accepts only the canonical decimal form `Display` produces
fn parse_id(id: &str) -> Result<u64, TokenError> {
    let canonical = !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && (id == "0" || !id.starts_with('0'));
    if !canonical {
        return Err(TokenError::InvalidId(id.to_string()));
    }
    id.parse::<u64>()
        .map_err(|_| TokenError::InvalidId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            SelectionToken::new(MediaKind::Tv, 1396).to_string(),
            "select_tv_1396"
        );
    }

    #[test]
    fn test_parse_rejects_other_callbacks() {
        assert_eq!(
            "retry_no_loop".parse::<SelectionToken>(),
            Err(TokenError::NotASelection("retry_no_loop".to_string()))
        );
        assert_eq!(
            "select_person_1".parse::<SelectionToken>(),
            Err(TokenError::UnknownKind("person".to_string()))
        );
        assert_eq!(
            "select_movie_".parse::<SelectionToken>(),
            Err(TokenError::InvalidId(String::new()))
        );
        assert_eq!(
            "select_movie".parse::<SelectionToken>(),
            Err(TokenError::InvalidId("movie".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_non_canonical_ids() {
        for data in ["select_movie_+603", "select_movie_0603", "select_tv_ 1", "select_tv_1e3"] {
            assert!(
                matches!(data.parse::<SelectionToken>(), Err(TokenError::InvalidId(_))),
                "{data} should be rejected"
            );
        }
        let token: SelectionToken = "select_movie_0".parse().expect("zero is canonical");
        assert_eq!(token.to_string(), "select_movie_0");
    }

    #[test]
    fn test_parse_display_round_trip_is_exact() {
        for data in ["select_movie_603", "select_tv_1396", "select_tv_18446744073709551615"] {
            let token: SelectionToken = data.parse().expect("valid token");
            assert_eq!(token.to_string(), data);
        }
    }

    #[test]
    fn test_fits_callback_data_limit() {
        // Telegram caps callback data at 64 bytes
        let token = SelectionToken::new(MediaKind::Movie, u64::MAX).to_string();
        assert!(token.len() <= 64);
    }
}
