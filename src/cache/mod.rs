//! Time-expiring lookup cache
//!
//! Holds whole snapshots under string keys. A snapshot is only ever fully
//! populated or fully invalidated; there is no partial update.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default expiration window for cached snapshots
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default interval between background expiry sweeps
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone)]
pub struct LookupCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<V> LookupCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns a copy of the snapshot under `key`, unless absent or expired
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                trace!(key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                trace!(key, "Cache entry expired");
                None
            }
            None => {
                trace!(key, "Cache miss");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        trace!(key, ttl_secs = ttl.as_secs(), "Cache entry stored");
    }

    pub async fn invalidate(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            debug!(key, "Cache entry invalidated");
        }
    }

    pub async fn flush(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included until the next purge
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Periodically purge expired entries for as long as the task is alive
    pub fn spawn_expiry_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Expired cache entries purged");
                }
            }
        })
    }
}

impl<V> Default for LookupCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
