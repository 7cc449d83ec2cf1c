//! Two-tier image cache
//!
//! Maps a resource identifier to a previously decoded image so repeated
//! loads skip the network.
//!
//! # Tiers
//!
//! | Tier | Bound | Lifetime |
//! |------|-------|----------|
//! | Memory | entry count and byte cost, LRU eviction | process |
//! | Disk | none | until invalidated |
//!
//! `get` consults memory first, then disk, promoting disk hits into
//! memory. `put` stores into memory immediately and persists to disk in a
//! background task; a failed disk write is logged and otherwise ignored.
//!
//! One cache is built per process by the composition root and shared
//! behind an `Arc`; there is no global instance.

pub mod disk;
pub mod memory;

pub use disk::{DiskCache, FIXED_SLOT_NAME};
pub use memory::MemoryCache;

use crate::config::{Config, ConfigManager};
use crate::error::FetchResult;
use crate::payload::Image;
use crate::resource::ResourceId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Process-wide image cache, shared by reference
pub struct ImageCache {
    memory: MemoryCache,
    disk: Option<DiskCache>,
    writes: Arc<PendingWrites>,
}

/// Counts background disk writes so callers about to exit can wait for them
#[derive(Default)]
struct PendingWrites {
    active: AtomicUsize,
    idle: Notify,
}

impl PendingWrites {
    fn finish_one(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl ImageCache {
    pub fn new(memory: MemoryCache, disk: Option<DiskCache>) -> Self {
        Self {
            memory,
            disk,
            writes: Arc::default(),
        }
    }

    /// Memory-only cache
    pub fn in_memory(capacity: usize, max_bytes: usize) -> Self {
        Self::new(MemoryCache::new(capacity, max_bytes), None)
    }

    /// Build the cache described by `[cache]`
    pub fn from_config(config: &Config) -> Self {
        let memory = MemoryCache::new(config.cache.memory_capacity, config.cache.memory_max_bytes);
        let disk = config.cache.disk_enabled.then(|| {
            DiskCache::new(
                ConfigManager::disk_cache_dir(config),
                config.cache.disk_keying,
            )
        });
        Self::new(memory, disk)
    }

    /// Look up an image. Disk read failures count as a miss.
    pub async fn get(&self, id: &ResourceId) -> Option<Image> {
        if let Some(image) = self.memory.get(id.key()) {
            debug!("Memory cache hit for {}", id);
            return Some(image);
        }

        let disk = self.disk.as_ref()?;
        match disk.load(id.key()).await {
            Ok(Some(image)) => {
                self.memory.insert(id.key().to_string(), image.clone());
                Some(image)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Disk cache read for {} failed: {}", id, e);
                None
            }
        }
    }

    /// Store an image. Memory is updated before this returns; the disk
    /// write runs in the background and its handle is returned when one
    /// was started.
    pub fn put(&self, id: &ResourceId, image: Image) -> Option<JoinHandle<()>> {
        self.memory.insert(id.key().to_string(), image.clone());

        let disk = self.disk.clone()?;
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, skipping disk cache write for {}", id);
                return None;
            }
        };

        let key = id.key().to_string();
        let writes = self.writes.clone();
        writes.active.fetch_add(1, Ordering::AcqRel);
        Some(handle.spawn(async move {
            if let Err(e) = disk.store(&key, &image).await {
                warn!("Disk cache write for {} failed: {}", key, e);
            }
            writes.finish_one();
        }))
    }

    /// Wait until every background disk write has finished
    pub async fn flush(&self) {
        loop {
            let idle = self.writes.idle.notified();
            if self.writes.active.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Drop one identifier from both tiers
    pub async fn invalidate(&self, id: &ResourceId) -> FetchResult<()> {
        self.memory.remove(id.key());
        if let Some(ref disk) = self.disk {
            disk.remove(id.key()).await?;
        }
        Ok(())
    }

    /// Drop everything from both tiers, returning the number of disk files
    /// removed
    pub async fn invalidate_all(&self) -> FetchResult<usize> {
        self.memory.clear();
        match self.disk {
            Some(ref disk) => disk.clear().await,
            None => Ok(0),
        }
    }

    /// Whether the memory tier holds `id`
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.memory.contains(id.key())
    }

    /// Number of images in the memory tier
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn disk(&self) -> Option<&DiskCache> {
        self.disk.as_ref()
    }
}
