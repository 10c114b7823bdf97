//! Short-lived buffer for identical repeated submissions.
//!
//! Keyed on the raw question text. Entries expire `ttl` after insertion and
//! reads never refresh them. When full, the oldest insertion is evicted.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

use super::models::ComposedUrl;

struct DuplicateEntry {
    url: ComposedUrl,
    inserted_at: Instant,
}

pub struct DuplicateCache {
    inner: Mutex<LruCache<String, DuplicateEntry>>,
    ttl: Duration,
}

impl DuplicateCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Previously composed answer for this exact text, if still fresh.
    pub fn get(&self, raw_question: &str) -> Option<ComposedUrl> {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        // peek: a hit must not move the entry or extend its life
        let expired = match cache.peek(raw_question) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.url.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(raw_question);
        }
        None
    }

    pub fn put(&self, raw_question: impl Into<String>, url: ComposedUrl) {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(
            raw_question.into(),
            DuplicateEntry {
                url,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Entries currently held, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> ComposedUrl {
        ComposedUrl::new(path)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = DuplicateCache::new(10, Duration::from_secs(60));
        cache.put("チケット", url("/2025/ticket"));

        tokio::time::advance(Duration::from_secs(59)).await;

        assert_eq!(cache.get("チケット"), Some(url("/2025/ticket")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_and_reads_do_not_refresh() {
        let cache = DuplicateCache::new(10, Duration::from_secs(60));
        cache.put("チケット", url("/2025/ticket"));

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(cache.get("チケット").is_some());

        tokio::time::advance(Duration::from_secs(21)).await;
        assert!(cache.get("チケット").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_not_normalized() {
        let cache = DuplicateCache::new(10, Duration::from_secs(60));
        cache.put("about", url("/others/about"));

        assert!(cache.get("ABOUT").is_none());
        assert!(cache.get("about ").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oldest_insert_is_evicted_when_full() {
        let cache = DuplicateCache::new(2, Duration::from_secs(60));
        cache.put("a", url("/a"));
        cache.put("b", url("/b"));

        // reading "a" must not protect it from eviction
        assert!(cache.get("a").is_some());
        cache.put("c", url("/c"));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }
}
