use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{BearerFetcher, FetchError};

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Caches fetched full tokens per member id.
///
/// Failed fetches are not cached. Entries expire after the TTL and are
/// purged lazily on the next insert.
#[derive(Debug)]
pub struct CachedBearerFetcher<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl<F: BearerFetcher> CachedBearerFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(member_id: &str) -> String {
        format!("bearer#{member_id}")
    }
}

#[async_trait]
impl<F: BearerFetcher> BearerFetcher for CachedBearerFetcher<F> {
    async fn fetch(&self, member_id: &str, authorization: &str) -> Result<String, FetchError> {
        let key = Self::key(member_id);

        {
            let entries = self.entries.lock().await;
            if let Some((stored_at, token)) = entries.get(&key) {
                if stored_at.elapsed() < self.ttl {
                    debug!(member_id, "full token served from cache");
                    return Ok(token.clone());
                }
            }
        }

        let token = self.inner.fetch(member_id, authorization).await?;

        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key, (Instant::now(), token.clone()));
        Ok(token)
    }
}
