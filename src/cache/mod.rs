//! Snapshot cache with expiry, versioned writes, and read strategies
//!
//! Holds the latest merged snapshot per logical key. Entries expire after a
//! fixed time-to-live: expiry is lazy (checked on access) plus a periodic
//! sweep task. Every stored and returned value is an independent owned
//! clone, so a caller mutating its handle cannot corrupt cached state.
//!
//! Writes carry a monotonically increasing version stamp. A slow refresh
//! that loses the race to a later write is discarded as a no-op, so the
//! cache always reflects the most recently *completed* merge — never an
//! older result that merely finished last.

use crate::graph::GraphSnapshot;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Cache key for the whole-graph snapshot.
pub const FULL_GRAPH_KEY: &str = "full-graph";
/// Cache key for filtered subsets.
pub const FILTERED_GRAPH_KEY: &str = "filtered-graph";
/// Cache key for search results.
pub const SEARCH_RESULTS_KEY: &str = "search-results";

/// Read policy governing whether a cached value is trusted versus refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadStrategy {
    /// Cached value if present and unexpired, otherwise fetch and store
    CacheFirst,
    /// Always fetch fresh and overwrite
    NetworkFirst,
    /// Cached value immediately; a background fetch refreshes for next time
    StaleWhileRevalidate,
}

/// Immutable cache configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry time-to-live
    pub ttl: Duration,
    /// Interval of the proactive expiry sweep
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Read-only view of the running counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
}

struct Entry {
    snapshot: GraphSnapshot,
    written_at: Instant,
    version: u64,
}

/// In-memory snapshot cache keyed by logical name.
///
/// `DashMap` serializes all reads and writes to a given key; multi-step
/// versioned commits go through the entry API so concurrent writers never
/// interleave partial state.
pub struct SnapshotCache {
    entries: DashMap<String, Entry>,
    config: CacheConfig,
    version_counter: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl SnapshotCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            version_counter: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Issue a fresh version stamp. Callers that fetch take a stamp before
    /// the fetch starts and commit with it, so late results lose races.
    pub fn next_version(&self) -> u64 {
        self.version_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store a snapshot unconditionally, under a fresh version stamp.
    pub fn set(&self, key: &str, snapshot: GraphSnapshot) {
        let version = self.next_version();
        self.commit(key, snapshot, version);
    }

    /// Store a snapshot carrying the given version stamp.
    ///
    /// Returns false (a no-op, not an error) if the key already holds a
    /// newer version — the caller's result lost the race and is discarded.
    pub fn commit(&self, key: &str, snapshot: GraphSnapshot, version: u64) -> bool {
        use dashmap::mapref::entry::Entry as MapEntry;

        let mut accepted = true;
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().version > version {
                    accepted = false;
                } else {
                    occupied.insert(Entry {
                        snapshot,
                        written_at: Instant::now(),
                        version,
                    });
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    snapshot,
                    written_at: Instant::now(),
                    version,
                });
            }
        }
        if accepted {
            self.writes.fetch_add(1, Ordering::Relaxed);
        } else {
            debug!(key, version, "discarding stale cache write");
        }
        accepted
    }

    /// Get an owned copy of the cached snapshot, if present and unexpired.
    ///
    /// An expired entry is evicted on access and reported absent.
    pub fn get(&self, key: &str) -> Option<GraphSnapshot> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.written_at.elapsed() <= self.config.ttl {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.snapshot.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key, "evicted expired cache entry on access");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Whether an unexpired entry exists. Does not touch hit/miss counters.
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.written_at.elapsed() <= self.config.ttl)
            .unwrap_or(false)
    }

    /// Drop one key.
    pub fn invalidate(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        let removed = self.entries.len() as u64;
        self.entries.clear();
        self.evictions.fetch_add(removed, Ordering::Relaxed);
    }

    /// Proactively evict every expired entry.
    pub fn sweep(&self) -> usize {
        let ttl = self.config.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.written_at.elapsed() <= ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "expiry sweep evicted entries");
        }
        removed
    }

    /// Run the periodic expiry sweep until the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.sweep();
                    }
                    None => break,
                }
            }
        })
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
