//! Outbound HTTP seam used by the fetch cache.

use super::FetchError;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

/// Issues a single GET and decodes the JSON body
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch `url`, giving up after `timeout`
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError>;
}

/// `reqwest`-backed upstream
#[derive(Clone, Default)]
pub struct HttpUpstream {
    client: HttpClient,
}

impl HttpUpstream {
    /// Wraps an existing client; timeouts are applied per request
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))
    }
}

fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    // The URL carries the api_key
    let err = err.without_url();
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else if err.is_decode() {
        FetchError::Json(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}
