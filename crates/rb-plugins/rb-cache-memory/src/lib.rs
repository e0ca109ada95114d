//! # rb-cache-memory
//!
//! Process-local `PageCache` on top of moka. Entries expire a fixed time
//! after insertion; `clear` empties the cache at once.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rb_core::traits::PageCache;

pub struct MemoryPageCache {
    inner: Cache<String, String>,
}

impl MemoryPageCache {
    pub fn new(time_to_live: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(time_to_live)
                .build(),
        }
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: String, rendered: String) {
        self.inner.insert(key, rendered).await;
    }

    async fn clear(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_until_cleared() {
        let cache = MemoryPageCache::new(Duration::from_secs(20), 16);
        cache.insert("/".into(), "first".into()).await;
        assert_eq!(cache.get("/").await.as_deref(), Some("first"));
        assert_eq!(cache.get("/?page=2").await, None);

        cache.clear().await;
        assert_eq!(cache.get("/").await, None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = MemoryPageCache::new(Duration::from_millis(50), 16);
        cache.insert("/".into(), "stale soon".into()).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get("/").await, None);
    }
}
