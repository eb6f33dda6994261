//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use filmfinder::cache::{FetchCache, FetchError, FetchPolicy, ManualClock, Upstream};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROXY: &str = "https://proxy.test/raw?url=";

/// Upstream that answers from a URL-keyed table and records every call
#[derive(Default)]
pub struct RecordingUpstream {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl RecordingUpstream {
    pub fn respond(&self, url: &str, body: Value) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(url.to_string(), body);
    }

    pub fn forget(&self, url: &str) {
        self.responses.lock().expect("responses lock").remove(url);
    }

    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((url.to_string(), timeout));
        // Let concurrent callers interleave like real network I/O
        tokio::task::yield_now().await;
        self.responses
            .lock()
            .expect("responses lock")
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(502))
    }
}

pub fn policy() -> FetchPolicy {
    FetchPolicy {
        ttl: Duration::from_secs(600),
        primary_timeout: Duration::from_secs(5),
        fallback_timeout: Duration::from_secs(8),
        proxy_base: PROXY.to_string(),
    }
}

pub fn cache(upstream: &Arc<RecordingUpstream>, clock: &Arc<ManualClock>) -> Arc<FetchCache> {
    Arc::new(FetchCache::new(upstream.clone(), clock.clone(), policy()))
}
