use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};

/// One persisted verdict, serialized as `[title, isPositive]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry(pub String, pub bool);

/// Persisted form of the cache, least recently used first.
pub type CacheSnapshot = Vec<CacheEntry>;

/// Bounded title -> verdict cache used for the duration of a pipeline run.
pub struct ClassificationCache {
    entries: LruCache<String, bool>,
}

impl ClassificationCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn from_snapshot(snapshot: CacheSnapshot, capacity: NonZeroUsize) -> Self {
        let mut cache = Self::new(capacity);
        for CacheEntry(title, is_positive) in snapshot {
            cache.entries.put(title, is_positive);
        }
        cache
    }

    /// Looks up a verdict and marks the title as recently used.
    pub fn get(&mut self, title: &str) -> Option<bool> {
        self.entries.get(title).copied()
    }

    pub fn insert(&mut self, title: String, is_positive: bool) {
        if let Some((evicted, _)) = self.entries.push(title.clone(), is_positive) {
            if evicted != title {
                tracing::debug!(target: "pipeline", title = %evicted, "cache bound reached; evicted");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_snapshot(&self) -> CacheSnapshot {
        self.entries
            .iter()
            .rev()
            .map(|(title, is_positive)| CacheEntry(title.clone(), *is_positive))
            .collect()
    }
}
