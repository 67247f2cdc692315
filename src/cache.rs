//! Time-boxed in-memory cache for fetched price sets
//!
//! One entry per (source, query, region) fingerprint. Entries expire lazily:
//! an expired entry is evicted by the read that finds it, no background
//! sweeper runs. The cache is an optimization only — every caller must
//! behave correctly when it is empty.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::shared::types::{PriceRecord, SourceLabel};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Deterministic fingerprint for one source query.
/// The query term is case-insensitive.
pub fn cache_key(source: SourceLabel, term: &str, region: &str) -> String {
    format!("{}:{}:{}", source.id(), term.trim().to_lowercase(), region)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<PriceRecord>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Process-scoped price cache, explicitly constructed and shared via `Arc`
#[derive(Debug)]
pub struct PriceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl PriceCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Fetch a cached result set. Returns `None` both on a miss and on an
    /// expired entry; expiry evicts the entry on this read.
    pub async fn get(&self, key: &str) -> Option<Vec<PriceRecord>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.records.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but is stale: evict under the write lock
        let mut entries = self.entries.write().await;
        if entries.get(key).map(|e| e.is_expired()).unwrap_or(false) {
            debug!("Evicting expired cache entry: {}", key);
            entries.remove(key);
        }
        None
    }

    /// Store a result set under `key`, overwriting any previous entry
    pub async fn set(&self, key: &str, records: Vec<PriceRecord>) {
        self.set_with_ttl(key, records, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: &str, records: Vec<PriceRecord>, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                records,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Administrative escape hatch: drop every entry immediately
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
