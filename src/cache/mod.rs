//! Three-state result cache for poll outcomes
//!
//! Poll results are cached under the target's fingerprint in one of three
//! observable states: no live entry (the target should be polled), a live
//! failure marker (recent poll failed, hold off), or a live snapshot.
//! Failure markers carry a shorter lifetime than snapshots, which is what
//! turns the cache into a retry backoff for broken targets.

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::inventory::InventorySnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A poll outcome as stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "snapshot", rename_all = "snake_case")]
pub enum CachedPoll {
    /// The most recent poll attempt failed; suppress retries until expiry
    Failed,
    /// Complete inventory snapshot from a successful poll
    Snapshot(InventorySnapshot),
}

/// Result of a cache lookup, distinguishing expiry from recorded failure
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// No live entry: the target has not been polled recently
    Miss,
    /// A failure marker is live: the backoff window is still open
    Failed,
    /// A snapshot is live and servable
    Fresh(InventorySnapshot),
}

/// Storage backend for poll outcomes.
///
/// `get` must never surface an expired entry; expiry is indistinguishable
/// from never-written. Errors from the backend are store errors only and
/// never encode a missing key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the live entry for a key, if any
    async fn get(&self, key: &Fingerprint) -> Result<Option<CachedPoll>>;

    /// Store an entry with the given lifetime, replacing any previous one
    async fn set(&self, key: &Fingerprint, value: CachedPoll, ttl: Duration) -> Result<()>;
}

/// Classify the live cache entry for a key
pub async fn lookup_poll(store: &dyn CacheStore, key: &Fingerprint) -> Result<CacheLookup> {
    Ok(match store.get(key).await? {
        None => CacheLookup::Miss,
        Some(CachedPoll::Failed) => CacheLookup::Failed,
        Some(CachedPoll::Snapshot(snapshot)) => CacheLookup::Fresh(snapshot),
    })
}

/// In-process cache keyed by target fingerprint.
///
/// Entries are dropped lazily: an expired entry is removed the next time
/// its key is read, and `purge_expired` sweeps the rest for long-running
/// processes with many one-off targets.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: CachedPoll,
    expires_at: Instant,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Remove all entries
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop entries whose lifetime has elapsed
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .retain(|_, entry| entry.expires_at > now);
    }

    /// Get cache statistics
    pub async fn statistics(&self) -> CacheStatistics {
        let entries = self.entries.read().await;
        let now = Instant::now();
        let expired = entries.values().filter(|e| e.expires_at <= now).count();

        CacheStatistics {
            total_entries: entries.len(),
            expired_entries: expired,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &Fingerprint) -> Result<Option<CachedPoll>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key.as_str()) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => {} // expired, fall through to removal
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key.as_str()) {
            if entry.expires_at > Instant::now() {
                // Re-written between the read and write locks
                return Ok(Some(entry.value.clone()));
            }
            entries.remove(key.as_str());
        }

        Ok(None)
    }

    async fn set(&self, key: &Fingerprint, value: CachedPoll, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.as_str().to_string(),
            StoredEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(())
    }
}

/// Cache occupancy counters
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: usize,
    pub expired_entries: usize,
}
