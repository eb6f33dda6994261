//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the bot's fixed constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// TMDB API key (v3)
    pub tmdb_api_key: String,

    /// Base URL of the TMDB REST API
    #[serde(default = "default_tmdb_api_base")]
    pub tmdb_api_base: String,
    /// Base URL prepended to poster paths
    #[serde(default = "default_tmdb_image_base")]
    pub tmdb_image_base: String,

    /// Proxy endpoint the percent-encoded target URL is appended to
    #[serde(default = "default_fallback_proxy_url")]
    pub fallback_proxy_url: String,

    /// Seconds a cached response stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Timeout for the direct request
    #[serde(default = "default_primary_timeout_secs")]
    pub primary_timeout_secs: u64,
    /// Timeout for the request routed through the proxy
    #[serde(default = "default_fallback_timeout_secs")]
    pub fallback_timeout_secs: u64,

    /// First "watch" link template (`{kind}` and `{id}` are substituted)
    #[serde(default = "default_watch_link_primary")]
    pub watch_link_primary: String,
    /// Second "watch" link template
    #[serde(default = "default_watch_link_secondary")]
    pub watch_link_secondary: String,
    /// "Download" link template
    #[serde(default = "default_download_link")]
    pub download_link: String,
}

fn default_tmdb_api_base() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_fallback_proxy_url() -> String {
    "https://api.allorigins.win/raw?url=".to_string()
}

const fn default_cache_ttl_secs() -> u64 {
    CACHE_TTL_SECS
}

const fn default_primary_timeout_secs() -> u64 {
    PRIMARY_TIMEOUT_SECS
}

const fn default_fallback_timeout_secs() -> u64 {
    FALLBACK_TIMEOUT_SECS
}

fn default_watch_link_primary() -> String {
    "https://www.themoviedb.org/{kind}/{id}".to_string()
}

fn default_watch_link_secondary() -> String {
    "https://www.themoviedb.org/{kind}/{id}/watch".to_string()
}

fn default_download_link() -> String {
    "https://www.justwatch.com/us/search?q=tmdb%3A{kind}%3A{id}".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filmfinder::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__CACHE_TTL_SECS=60 ./target/filmfinder`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Environment::default() maps UPPER_SNAKE_CASE to snake_case
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// How long a cached response is served without refetching
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Timeout for the direct upstream request
    #[must_use]
    pub const fn primary_timeout(&self) -> Duration {
        Duration::from_secs(self.primary_timeout_secs)
    }

    /// Timeout for the proxied upstream request
    #[must_use]
    pub const fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }

    /// The three outbound link templates in display order
    #[must_use]
    pub fn link_templates(&self) -> [&str; 3] {
        [
            &self.watch_link_primary,
            &self.watch_link_secondary,
            &self.download_link,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Single test to avoid environment variable races between tests
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Required keys plus defaults
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("TMDB_API_KEY", "dummy_key");

        let settings = Settings::new()?;
        assert_eq!(settings.tmdb_api_key, "dummy_key");
        assert_eq!(settings.tmdb_api_base, "https://api.themoviedb.org/3");
        assert_eq!(settings.cache_ttl(), Duration::from_secs(600));
        assert_eq!(settings.primary_timeout(), Duration::from_secs(5));
        assert_eq!(settings.fallback_timeout(), Duration::from_secs(8));

        // 2. Overrides from plain env vars
        env::set_var("CACHE_TTL_SECS", "60");
        env::set_var("FALLBACK_PROXY_URL", "https://proxy.test/?u=");

        let settings = Settings::new()?;
        assert_eq!(settings.cache_ttl(), Duration::from_secs(60));
        assert_eq!(settings.fallback_proxy_url, "https://proxy.test/?u=");

        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("FALLBACK_PROXY_URL");

        // 3. Empty env var is treated as unset
        env::set_var("FALLBACK_PROXY_URL", "");

        let settings = Settings::new()?;
        assert_eq!(
            settings.fallback_proxy_url,
            "https://api.allorigins.win/raw?url="
        );

        env::remove_var("FALLBACK_PROXY_URL");

        // 4. Missing API key is an error
        env::remove_var("TMDB_API_KEY");
        assert!(Settings::new().is_err());

        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }
}

/// Time-to-live of a cached upstream response (10 minutes)
pub const CACHE_TTL_SECS: u64 = 600;
/// Timeout for the direct upstream request
pub const PRIMARY_TIMEOUT_SECS: u64 = 5;
/// Timeout for the proxied request; the extra hop makes it slower
pub const FALLBACK_TIMEOUT_SECS: u64 = 8;

/// Maximum number of search matches offered as buttons
pub const MAX_SEARCH_RESULTS: usize = 10;
/// Telegram limit for photo captions
pub const CAPTION_LIMIT: usize = 1024;
/// Characters of the synopsis kept in a detail card
pub const OVERVIEW_LIMIT: usize = 600;

/// Web search used when TMDB has no matches
pub const WEB_SEARCH_BASE: &str = "https://www.google.com/search?q=";

// Telegram API retry configuration
/// Retries after the first Telegram API call fails, so at most four attempts
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff delay in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff delay in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
