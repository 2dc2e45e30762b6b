//! Rate table caching with TTL support.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::rate::RateTable;

/// Key the rate store caches the full table under.
pub const CACHE_KEY: &str = "conversion_rates";

/// Default lifetime of the cached table, in seconds.
pub const CACHE_TIME_SECS: i64 = 600;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    rates: Arc<RateTable>,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(rates: Arc<RateTable>, ttl: Duration) -> Self {
        Self {
            rates,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age < self.ttl
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Default TTL for cached tables.
    pub default_ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::seconds(CACHE_TIME_SECS),
        }
    }
}

/// Thread-safe rate cache with TTL.
///
/// Readers never block each other; concurrent writers to one key are
/// last-writer-wins.
pub struct RateCache {
    cache: DashMap<String, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a table from cache if valid.
    pub fn get(&self, key: &str) -> Option<Arc<RateTable>> {
        if let Some(entry) = self.cache.get(key) {
            if entry.is_valid() {
                debug!(key, "Cache hit");
                return Some(entry.rates.clone());
            }
            debug!(key, "Cache entry expired");
            drop(entry);
            // A writer may have refreshed the key since the read above.
            self.cache.remove_if(key, |_, entry| !entry.is_valid());
        }

        debug!(key, "Cache miss");
        None
    }

    /// Store a table with the default TTL.
    pub fn insert(&self, key: &str, rates: Arc<RateTable>) {
        self.set(key, rates, self.config.default_ttl);
    }

    /// Store a table with a custom TTL.
    pub fn set(&self, key: &str, rates: Arc<RateTable>, ttl: Duration) {
        self.cache.insert(key.to_string(), CacheEntry::new(rates, ttl));
    }

    pub fn remove(&self, key: &str) {
        self.cache.remove(key);
    }

    /// Clear all cached tables.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
