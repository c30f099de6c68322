//! Summary cache.
//!
//! Backend summaries are keyed by model and score payload so identical
//! score sets skip a second generation call. Local-fallback summaries are
//! never stored here.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use polyrisk_core::Summary;

use crate::config::CacheConfig;

/// Cache key for a generated summary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    payload_hash: u64,
}

impl CacheKey {
    pub fn new(model: &str, payload: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        payload.hash(&mut hasher);
        Self {
            model: model.to_string(),
            payload_hash: hasher.finish(),
        }
    }
}

/// Summary cache using moka.
pub struct SummaryCache {
    cache: Cache<CacheKey, Summary>,
}

impl SummaryCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Summary> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, summary: Summary) {
        self.cache.insert(key, summary).await;
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
