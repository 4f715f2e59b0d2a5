//! LRU cache for loaded weight matrices.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegridConfig;
use crate::error::Result;
use crate::sparse::SparseWeightMatrix;
use crate::weights::read_weights;

/// Cache key for weight matrices: the file they came from and the requested shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightKey {
    pub path_hash: u64,
    pub n_in: usize,
    pub n_out: usize,
}

impl WeightKey {
    /// Key for a weight file loaded with the given grid sizes.
    pub fn new(path: &Path, n_in: usize, n_out: usize) -> Self {
        Self {
            path_hash: hash_path(path),
            n_in,
            n_out,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that were hits.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of weight matrices, bounded by entry count.
///
/// Matrices are handed out as `Arc`s, so a cached matrix keeps its CSR form
/// across regridders that share it. Wrap in a `Mutex` to share between threads.
pub struct WeightCache {
    cache: LruCache<WeightKey, Arc<SparseWeightMatrix>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl WeightCache {
    /// Create a cache holding at most `capacity` matrices (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: LruCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a cache sized by `weight_cache_entries`.
    pub fn from_config(config: &RegridConfig) -> Self {
        Self::new(config.weight_cache_entries)
    }

    /// Try to get a matrix from the cache.
    pub fn get(&mut self, key: &WeightKey) -> Option<Arc<SparseWeightMatrix>> {
        if let Some(matrix) = self.cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(matrix))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Check if a key exists in the cache without updating LRU order.
    pub fn contains(&self, key: &WeightKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a matrix, evicting the least recently used one if full.
    pub fn insert(&mut self, key: WeightKey, matrix: Arc<SparseWeightMatrix>) {
        if let Some((evicted, _)) = self.cache.push(key, matrix) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get the matrix for a weight file, loading and caching it on a miss.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        n_in: usize,
        n_out: usize,
    ) -> Result<Arc<SparseWeightMatrix>> {
        let key = WeightKey::new(path, n_in, n_out);

        if let Some(matrix) = self.get(&key) {
            debug!(path = %path.display(), "Weight cache hit");
            return Ok(matrix);
        }

        debug!(path = %path.display(), "Weight cache miss, loading");
        let matrix = Arc::new(read_weights(path, n_in, n_out)?);
        self.insert(key, Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Get the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Hash a weight file path for use in a cache key.
pub fn hash_path(path: &Path) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}
