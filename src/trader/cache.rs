//! Read-through TTL cache

use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::common::errors::Result;

/// A cached value and when it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Valid iff `age < ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// Single-slot cache with a time-to-live
///
/// Reads take the shared lock; a refresh takes the exclusive lock only to
/// swap in the new entry, never across the fetch itself. Concurrent misses
/// each fetch and the last writer wins.
#[derive(Debug)]
pub struct TtlCache<T> {
    name: &'static str,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached entry, if one exists and has not expired
    pub async fn get_fresh(&self) -> Option<CacheEntry<T>> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    /// Return the fresh entry, or run `fetch` and store its result
    ///
    /// A failed fetch leaves any previous (expired) entry in place and
    /// returns the error; the expired value is never handed out.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<CacheEntry<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(entry) = self.get_fresh().await {
            debug!(
                cache = self.name,
                age_ms = entry.age().as_millis() as u64,
                "cache hit"
            );
            return Ok(entry);
        }

        debug!(cache = self.name, "cache miss, refreshing");
        let value = fetch().await?;
        Ok(self.store(value).await)
    }

    async fn store(&self, value: T) -> CacheEntry<T> {
        let entry = CacheEntry {
            value,
            fetched_at: Instant::now(),
        };
        *self.entry.write().await = Some(entry.clone());
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::GatewayError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(15);

    async fn counted_fetch(calls: &AtomicUsize, value: u32) -> Result<u32> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_refresh(|| counted_fetch(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_millis(14_999)).await;
        let second = cache.get_or_refresh(|| counted_fetch(&calls, 2)).await.unwrap();

        assert_eq!(first.value, 1);
        assert_eq!(second.value, 1);
        assert_eq!(first.fetched_at, second.fetched_at);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_exactly_at_ttl() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        cache.get_or_refresh(|| counted_fetch(&calls, 1)).await.unwrap();
        tokio::time::advance(TTL).await;
        assert!(cache.get_fresh().await.is_none());

        let refreshed = cache.get_or_refresh(|| counted_fetch(&calls, 2)).await.unwrap();
        assert_eq!(refreshed.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_does_not_serve_stale() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        cache.get_or_refresh(|| counted_fetch(&calls, 1)).await.unwrap();
        tokio::time::advance(TTL).await;

        let failed = cache
            .get_or_refresh(|| async { Err::<u32, _>(GatewayError::Internal("down".into())) })
            .await;
        assert!(failed.is_err());

        // The next read tries again instead of returning the expired value
        let failed_again = cache
            .get_or_refresh(|| async { Err::<u32, _>(GatewayError::Internal("down".into())) })
            .await;
        assert!(failed_again.is_err());

        let recovered = cache.get_or_refresh(|| counted_fetch(&calls, 3)).await.unwrap();
        assert_eq!(recovered.value, 3);
    }

    #[tokio::test]
    async fn test_concurrent_readers_share_entry() {
        let cache = Arc::new(TtlCache::new("test", TTL));
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_refresh(|| counted_fetch(&calls, 7)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(|| counted_fetch(&calls, 99))
                    .await
                    .unwrap()
                    .value
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_each_fetch() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        let slow_fetch = |value: u32| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(value)
            }
        };

        let (a, b, c, d) = tokio::join!(
            cache.get_or_refresh(slow_fetch(1)),
            cache.get_or_refresh(slow_fetch(2)),
            cache.get_or_refresh(slow_fetch(3)),
            cache.get_or_refresh(slow_fetch(4)),
        );

        // Every caller gets the value it fetched; nobody waits on another's fetch
        let values: Vec<u32> = [a, b, c, d].into_iter().map(|r| r.unwrap().value).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // The cache holds one of the fetched values
        let stored = cache.get_fresh().await.unwrap().value;
        assert!(values.contains(&stored));
    }
}
