//! Parsed-user cache keyed by the raw `Authorization` header.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use tollgate_auth::User;
use tollgate_core::AuthResult;

use crate::parser::Parser;

pub const DEFAULT_CAPACITY: usize = 10_000;

type Slot = Arc<OnceCell<Arc<User>>>;

#[derive(Debug, Default)]
struct Slots {
    by_header: HashMap<String, Slot>,
    order: VecDeque<String>,
}

/// Wraps a [`Parser`] so each header is parsed at most once at a time.
///
/// Concurrent requests for the same header wait on a single parse. Failed
/// parses are never cached: the header is evicted and the next request
/// parses again. When full, the oldest header is evicted first.
#[derive(Debug)]
pub struct CachedParser<P> {
    inner: P,
    capacity: usize,
    slots: Mutex<Slots>,
}

impl<P: Parser> CachedParser<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            slots: Mutex::new(Slots::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.by_header.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop the cached user for `authorization`, if any.
    pub async fn remove(&self, authorization: &str) {
        let mut slots = self.slots.lock().await;
        if slots.by_header.remove(authorization).is_some() {
            slots.order.retain(|h| h != authorization);
        }
    }

    async fn slot(&self, authorization: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.by_header.get(authorization) {
            return slot.clone();
        }

        while slots.by_header.len() >= self.capacity {
            let Some(oldest) = slots.order.pop_front() else {
                break;
            };
            slots.by_header.remove(&oldest);
        }

        let slot = Slot::default();
        slots.by_header.insert(authorization.to_string(), slot.clone());
        slots.order.push_back(authorization.to_string());
        slot
    }

    /// Evict `authorization` only if it still maps to `slot`.
    async fn evict(&self, authorization: &str, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        let same = slots
            .by_header
            .get(authorization)
            .is_some_and(|current| Arc::ptr_eq(current, slot));
        if same {
            slots.by_header.remove(authorization);
            slots.order.retain(|h| h != authorization);
        }
    }
}

#[async_trait]
impl<P: Parser> Parser for CachedParser<P> {
    async fn parse(&self, authorization: &str) -> AuthResult<Arc<User>> {
        let slot = self.slot(authorization).await;

        match slot
            .get_or_try_init(|| self.inner.parse(authorization))
            .await
        {
            Ok(user) => Ok(user.clone()),
            Err(err) => {
                debug!(error = %err, "parse failed; evicting header");
                self.evict(authorization, &slot).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnParser;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tollgate_core::AuthError;

    fn counting(calls: Arc<AtomicUsize>) -> FnParser {
        FnParser::new(move |header: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            if header.ends_with("bad") {
                return Err(AuthError::invalid_credential("rejected"));
            }
            Ok(User {
                authorization: header.to_string(),
                ..Default::default()
            })
        })
    }

    #[tokio::test]
    async fn same_header_is_parsed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedParser::new(counting(calls.clone()));

        let a = cache.parse("Bearer a").await.unwrap();
        let b = cache.parse("Bearer a").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_parse() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = {
            let calls = calls.clone();
            FnParser::new_async(move |header: String| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(User {
                        authorization: header,
                        ..Default::default()
                    })
                }
            })
        };
        let cache = Arc::new(CachedParser::new(inner));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.parse("Bearer same").await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().authorization, "Bearer same");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_evicted_and_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedParser::new(counting(calls.clone()));

        assert!(matches!(
            cache.parse("Bearer bad").await,
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(cache.is_empty().await);
        assert!(cache.parse("Bearer bad").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oldest_header_is_evicted_at_capacity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedParser::with_capacity(counting(calls.clone()), 2);

        cache.parse("Bearer 1").await.unwrap();
        cache.parse("Bearer 2").await.unwrap();
        cache.parse("Bearer 3").await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.parse("Bearer 3").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        cache.parse("Bearer 1").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn remove_forces_a_fresh_parse() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedParser::new(counting(calls.clone()));

        cache.parse("Bearer a").await.unwrap();
        cache.remove("Bearer a").await;
        cache.parse("Bearer a").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
