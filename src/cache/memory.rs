//! Bounded in-memory image tier
//!
//! Holds at most `capacity` images and at most `max_bytes` of encoded
//! payload. When either bound is exceeded the least recently used entries
//! are dropped. Lookups hand out clones that share the payload, so an entry
//! evicted after a `get` stays alive for whoever got it.

use crate::payload::Image;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Thread-safe LRU tier bounded by count and byte cost
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_bytes: usize,
}

struct Inner {
    entries: LruCache<String, Image>,
    bytes: usize,
}

impl MemoryCache {
    /// Create a tier holding at most `capacity` entries (minimum 1) and
    /// `max_bytes` of payload
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Look up an image, marking it most recently used
    pub fn get(&self, key: &str) -> Option<Image> {
        self.lock().entries.get(key).cloned()
    }

    /// Whether an entry exists, without touching recency
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Insert or replace an image, then evict down to the byte budget.
    /// The newest entry is never evicted, even if it alone is over budget.
    pub fn insert(&self, key: String, image: Image) {
        let mut inner = self.lock();
        inner.bytes += image.cost();

        if let Some((old_key, old)) = inner.entries.push(key, image) {
            inner.bytes -= old.cost();
            debug!("Memory tier dropped {}", old_key);
        }

        while inner.bytes > self.max_bytes && inner.entries.len() > 1 {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.bytes -= evicted.cost();
                    debug!("Memory tier evicted {} ({} bytes)", evicted_key, evicted.cost());
                }
                None => break,
            }
        }
    }

    /// Remove one entry
    pub fn remove(&self, key: &str) -> Option<Image> {
        let mut inner = self.lock();
        let removed = inner.entries.pop(key);
        if let Some(ref image) = removed {
            inner.bytes -= image.cost();
        }
        removed
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summed payload size of all entries
    pub fn bytes(&self) -> usize {
        self.lock().bytes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
