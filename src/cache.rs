//! In-memory response cache for proxied playlists and segments.
//!
//! Keys are the requested upstream URLs. Values are opaque payloads: the
//! rewritten playlist text or the raw segment bytes. Every entry gets the
//! same TTL at insert time; an expired entry is indistinguishable from a miss.
//!
//! The store is unbounded in entry count. Growth is bounded by the TTL and
//! by [`ResponseCache::purge_expired`], which the server runs periodically.

use axum::body::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default TTL for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Clone, Debug)]
struct CachedEntry {
    payload: Bytes,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe response cache with a fixed TTL per entry.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CachedEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache that expires entries `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Try to get a cached payload for the given URL.
    ///
    /// Returns `Some(payload)` if a fresh entry exists, `None` otherwise.
    pub fn get(&self, url: &str) -> Option<Bytes> {
        if let Some(entry) = self.entries.get(url) {
            if entry.is_fresh() {
                debug!("Response cache HIT for {}", url);
                return Some(entry.payload.clone());
            }
            // Stale: drop the read guard before removing
            drop(entry);
            self.entries.remove_if(url, |_, entry| !entry.is_fresh());
        }
        debug!("Response cache MISS for {}", url);
        None
    }

    /// Insert or replace the payload for a URL. Expiry is fixed here.
    pub fn insert(&self, url: &str, payload: Bytes) {
        self.entries.insert(
            url.to_string(),
            CachedEntry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
