//! Per-run manifest cache with request coalescing.
//!
//! Each (platform, media type) key owns a `OnceCell`. Concurrent callers for
//! an uncached key wait on the same cell, so only one fetch is in flight per
//! key. A failed fetch leaves the cell empty and the next caller retries.

use super::index::ManifestIndex;
use crate::models::{MediaType, PlatformId};
use crate::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Cache key for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManifestKey {
    pub platform: PlatformId,
    pub media: MediaType,
}

impl ManifestKey {
    pub fn new(platform: PlatformId, media: MediaType) -> Self {
        Self { platform, media }
    }
}

type Slot = Arc<OnceCell<Arc<ManifestIndex>>>;

/// Manifest indexes fetched during this run.
#[derive(Debug, Default)]
pub struct ManifestCache {
    slots: Mutex<HashMap<ManifestKey, Slot>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `key`, running `fetch` if it is missing.
    pub async fn get_or_fetch<F, Fut>(&self, key: ManifestKey, fetch: F) -> Result<Arc<ManifestIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ManifestIndex>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(key).or_default().clone()
        };

        let index = slot
            .get_or_try_init(|| async move {
                debug!(
                    "Fetching manifest for platform {} ({})",
                    key.platform, key.media
                );
                fetch().await.map(Arc::new)
            })
            .await?;

        Ok(index.clone())
    }

    /// Return the cached index without fetching.
    pub async fn get(&self, key: ManifestKey) -> Option<Arc<ManifestIndex>> {
        let slots = self.slots.lock().await;
        slots.get(&key).and_then(|slot| slot.get().cloned())
    }

    /// Number of populated entries.
    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every cached index.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::ArtworkError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn key() -> ManifestKey {
        ManifestKey::new(PlatformId(3), MediaType::BoxFront)
    }

    #[tokio::test]
    async fn test_fetches_once_and_caches() {
        let cache = ManifestCache::new();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let calls = &calls;
            let index = cache
                .get_or_fetch(key(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ManifestIndex::from_names(["Mario Bros"]))
                })
                .await
                .unwrap();
            assert_eq!(index.len(), 1);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_coalesce() {
        let cache = Arc::new(ManifestCache::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(key(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(ManifestIndex::from_names(["Zelda (USA)"]))
                    })
                    .await
                    .map(|index| index.len())
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = ManifestCache::new();

        let err = cache
            .get_or_fetch(key(), || async {
                Err(ArtworkError::from(HttpError::network("offline", false)))
            })
            .await;
        assert!(err.is_err());
        assert!(cache.get(key()).await.is_none());
        assert!(cache.is_empty().await);

        let index = cache
            .get_or_fetch(key(), || async { Ok(ManifestIndex::from_names(["A"])) })
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent_and_clear_empties() {
        let cache = ManifestCache::new();
        let other = ManifestKey::new(PlatformId(3), MediaType::Screenshot);

        cache
            .get_or_fetch(key(), || async { Ok(ManifestIndex::from_names(["A"])) })
            .await
            .unwrap();
        cache
            .get_or_fetch(other, || async { Ok(ManifestIndex::from_names(["B", "C"])) })
            .await
            .unwrap();

        assert_eq!(cache.get(other).await.unwrap().len(), 2);
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
