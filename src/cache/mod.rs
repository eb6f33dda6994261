//! TTL fetch cache with a proxy fallback
//!
//! Memoizes upstream JSON responses by request URL. A failed direct request
//! is retried once through a proxy, and whichever path succeeds is cached
//! under the original URL so callers never see the detour.
//!
//! Concurrent misses for the same URL are not coalesced: each caller issues
//! its own upstream request and the last writer wins.

mod clock;
mod upstream;

pub use clock::{Clock, ManualClock, SystemClock};
pub use upstream::{HttpUpstream, Upstream};

#[cfg(test)]
pub use upstream::MockUpstream;

use crate::config::Settings;
use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a single fetch attempt or the whole fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),
    /// Upstream did not answer in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {0}")]
    Status(u16),
    /// Body was not valid JSON
    #[error("JSON error: {0}")]
    Json(String),
    /// Both the direct and the proxied request failed
    #[error("Primary request failed ({primary}); fallback failed ({fallback})")]
    Exhausted {
        /// Error from the direct request
        primary: Box<FetchError>,
        /// Error from the proxied request
        fallback: Box<FetchError>,
    },
}

/// A memoized response and the instant it was captured
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// When the fetch that produced this entry started
    pub stored_at: Instant,
    /// Decoded response body
    pub data: Arc<Value>,
}

/// Timing and routing knobs for [`FetchCache`]
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// How long an entry is served without refetching
    pub ttl: Duration,
    /// Timeout for the direct request
    pub primary_timeout: Duration,
    /// Timeout for the proxied request
    pub fallback_timeout: Duration,
    /// Prefix the percent-encoded target URL is appended to
    pub proxy_base: String,
}

impl FetchPolicy {
    /// Builds the policy from loaded settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ttl: settings.cache_ttl(),
            primary_timeout: settings.primary_timeout(),
            fallback_timeout: settings.fallback_timeout(),
            proxy_base: settings.fallback_proxy_url.clone(),
        }
    }

    /// URL of the proxied request for `url`
    ///
    /// # Examples
    ///
    /// ```
    /// use filmfinder::cache::FetchPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = FetchPolicy {
    ///     ttl: Duration::from_secs(600),
    ///     primary_timeout: Duration::from_secs(5),
    ///     fallback_timeout: Duration::from_secs(8),
    ///     proxy_base: "https://proxy.test/raw?url=".to_string(),
    /// };
    /// assert_eq!(
    ///     policy.proxied_url("https://a.test/x?q=1"),
    ///     "https://proxy.test/raw?url=https%3A%2F%2Fa.test%2Fx%3Fq%3D1"
    /// );
    /// ```
    #[must_use]
    pub fn proxied_url(&self, url: &str) -> String {
        format!("{}{}", self.proxy_base, urlencoding::encode(url))
    }
}

/// Process-wide response cache
///
/// Built once at startup and shared by reference. The map has no capacity
/// bound; stale entries are dropped lazily when a lookup finds them expired.
pub struct FetchCache {
    entries: Cache<String, CacheEntry>,
    upstream: Arc<dyn Upstream>,
    clock: Arc<dyn Clock>,
    policy: FetchPolicy,
}

impl FetchCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new(upstream: Arc<dyn Upstream>, clock: Arc<dyn Clock>, policy: FetchPolicy) -> Self {
        Self {
            // No max_capacity and no time_to_live: freshness is judged against `clock`
            entries: Cache::builder().build(),
            upstream,
            clock,
            policy,
        }
    }

    /// Returns the response body for `url`
    ///
    /// Served from the cache while fresh; otherwise fetched directly and,
    /// on failure, through the proxy.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Exhausted` when both the direct and the proxied
    /// request fail. Nothing is cached in that case.
    pub async fn fetch(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(url).await {
            if now.saturating_duration_since(entry.stored_at) < self.policy.ttl {
                debug!("Cache hit for {url}");
                return Ok(entry.data);
            }
            self.entries.invalidate(url).await;
        }

        let primary = match self
            .upstream
            .get_json(url, self.policy.primary_timeout)
            .await
        {
            Ok(data) => return Ok(self.store(url, now, data).await),
            Err(e) => e,
        };

        warn!("Primary fetch failed for {url}: {primary}. Retrying via proxy.");

        let proxied = self.policy.proxied_url(url);
        match self
            .upstream
            .get_json(&proxied, self.policy.fallback_timeout)
            .await
        {
            Ok(data) => Ok(self.store(url, now, data).await),
            Err(fallback) => {
                warn!("Fallback fetch failed for {url}: {fallback}");
                Err(FetchError::Exhausted {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })
            }
        }
    }

    async fn store(&self, url: &str, stored_at: Instant, data: Value) -> Arc<Value> {
        let data = Arc::new(data);
        self.entries
            .insert(
                url.to_string(),
                CacheEntry {
                    stored_at,
                    data: Arc::clone(&data),
                },
            )
            .await;
        data
    }

    /// Raw entry for `url` without a freshness check
    pub async fn peek(&self, url: &str) -> Option<CacheEntry> {
        self.entries.get(url).await
    }

    /// Number of entries, fresh or stale
    ///
    /// Moka updates this lazily; call after pending writes have settled.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Configured time-to-live
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.policy.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use serde_json::json;

    const URL: &str = "https://api.test/search/movie?query=rrr&api_key=k";
    const PROXY: &str = "https://proxy.test/raw?url=";

    fn policy() -> FetchPolicy {
        FetchPolicy {
            ttl: Duration::from_secs(600),
            primary_timeout: Duration::from_secs(5),
            fallback_timeout: Duration::from_secs(8),
            proxy_base: PROXY.to_string(),
        }
    }

    fn cache_with(mock: MockUpstream, clock: Arc<ManualClock>) -> FetchCache {
        FetchCache::new(Arc::new(mock), clock, policy())
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_upstream() {
        let mut mock = MockUpstream::new();
        mock.expect_get_json()
            .times(1)
            .returning(|_, _| Ok(json!({"results": []})));
        let cache = cache_with(mock, Arc::new(ManualClock::new()));

        let first = cache.fetch(URL).await.expect("first fetch");
        let second = cache.fetch(URL).await.expect("second fetch");

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_primary_uses_primary_timeout() {
        let mut mock = MockUpstream::new();
        mock.expect_get_json()
            .withf(|url, timeout| url.to_string() == URL && *timeout == Duration::from_secs(5))
            .times(1)
            .returning(|_, _| Ok(json!({})));
        let cache = cache_with(mock, Arc::new(ManualClock::new()));

        assert!(cache.fetch(URL).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let clock = Arc::new(ManualClock::new());
        let mut mock = MockUpstream::new();
        let mut seq = Sequence::new();
        mock.expect_get_json()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"v": 1})));
        mock.expect_get_json()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"v": 2})));
        let cache = cache_with(mock, Arc::clone(&clock));

        cache.fetch(URL).await.expect("first fetch");
        clock.advance(Duration::from_secs(600));
        let refreshed = cache.fetch(URL).await.expect("refetch");

        assert_eq!(refreshed["v"], 2);
    }

    #[tokio::test]
    async fn test_fallback_uses_encoded_url_and_longer_timeout() {
        let mut mock = MockUpstream::new();
        let mut seq = Sequence::new();
        mock.expect_get_json()
            .withf(|url, _| url.to_string() == URL)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, timeout| Err(FetchError::Timeout(timeout)));
        mock.expect_get_json()
            .withf(|url, timeout| {
                url.starts_with(PROXY)
                    && url.ends_with("https%3A%2F%2Fapi.test%2Fsearch%2Fmovie%3Fquery%3Drrr%26api_key%3Dk")
                    && *timeout == Duration::from_secs(8)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"via": "proxy"})));
        let cache = cache_with(mock, Arc::new(ManualClock::new()));

        let data = cache.fetch(URL).await.expect("fallback fetch");

        assert_eq!(data["via"], "proxy");
        assert!(cache.peek(URL).await.is_some());
    }

    #[tokio::test]
    async fn test_both_paths_failing_caches_nothing() {
        let mut mock = MockUpstream::new();
        mock.expect_get_json()
            .times(2)
            .returning(|_, _| Err(FetchError::Status(503)));
        let cache = cache_with(mock, Arc::new(ManualClock::new()));

        let err = cache.fetch(URL).await.expect_err("both paths fail");

        assert!(matches!(err, FetchError::Exhausted { .. }));
        assert!(cache.peek(URL).await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }
}
