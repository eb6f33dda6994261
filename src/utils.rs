//! Utility functions shared by the bot layer
//!
//! Unicode-safe truncation and a retry helper for Telegram API calls.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Truncates a string to at most `max_chars` characters
///
/// # Examples
///
/// ```
/// use filmfinder::utils::truncate_str;
/// let s = "Amélie, Léon";
/// assert_eq!(truncate_str(s, 6), "Amélie");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max attempts: 3 (see constants in `config.rs`)
///
/// # Examples
///
/// ```no_run
/// use filmfinder::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<()> {
///     Ok(())
/// }
///
/// # async fn example() -> Result<()> {
/// retry_telegram_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error once all attempts fail.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES + 1,
            e
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Crouching Tiger, 卧虎藏龙";
        assert_eq!(truncate_str(s, 19), "Crouching Tiger, 卧虎");
        assert_eq!(truncate_str(s, 50), s);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_transient_failure() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result = retry_telegram_operation(move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("connection reset");
            }
            Ok(42)
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<()> = retry_telegram_operation(move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("still down")
        })
        .await;

        assert!(result.is_err());
        // First try plus one per backoff step
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1 + crate::config::TELEGRAM_API_MAX_RETRIES
        );
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
