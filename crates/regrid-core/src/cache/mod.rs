//! Cache implementations for regridding.

mod weight_cache;

pub use weight_cache::{hash_path, CacheStats, WeightCache, WeightKey};
