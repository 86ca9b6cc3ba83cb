//! The TTL store backing every cache namespace.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Bounds and timing for a [`TtlCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries kept after a cleanup sweep.
    pub max_entries: usize,
    /// TTL applied to entries stored without an explicit TTL.
    pub default_ttl: Duration,
    /// Minimum interval between opportunistic cleanup sweeps.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Counters and bounds reported by [`TtlCache::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live entry.
    pub hits: u64,
    /// Lookups that found nothing, or only an expired entry.
    pub misses: u64,
    /// Entries removed by expiry, explicit eviction, or cleanup.
    pub evictions: u64,
    /// Entries currently stored (live and not-yet-swept expired alike).
    pub total_entries: usize,
    /// `hits / (hits + misses)`, zero when no lookups happened.
    pub hit_rate: f64,
    /// Configured entry bound.
    pub max_entries: usize,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl<V> Entry<V> {
    fn is_live(&self, override_ttl: Option<Duration>, default_ttl: Duration) -> bool {
        let ttl = override_ttl.or(self.ttl).unwrap_or(default_ttl);
        self.inserted_at.elapsed() < ttl
    }
}

/// String-keyed key/value store with per-entry timestamps and bounded size.
///
/// An entry is valid iff `now - inserted_at < ttl`, where the TTL is taken
/// from the lookup parameter first, then the entry's stored TTL, then the
/// configured default. Expired entries are logically absent: a lookup that
/// observes one counts as a miss and removes it.
///
/// Every write triggers an opportunistic cleanup check, which only acts when
/// the cleanup interval has elapsed *and* the store is over its entry bound.
/// Cleanup drops expired entries first, then the oldest-by-timestamp entries
/// until the store is at or under the bound.
///
/// All operations are total over the key space: a missing key is a miss,
/// never an error. State is purely in-memory.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    config: CacheConfig,
    last_cleanup: Instant,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V> TtlCache<V> {
    /// Creates an empty cache with the given bounds.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            last_cleanup: Instant::now(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Replaces the cache bounds. Existing entries are kept; the new bound
    /// applies from the next cleanup sweep.
    pub fn configure(&mut self, config: CacheConfig) {
        self.config = config;
    }

    /// Stores `value` under `key` with the default TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.insert(key.into(), value, None);
    }

    /// Stores `value` under `key` with an explicit TTL.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.insert(key.into(), value, Some(ttl));
    }

    /// Looks up `key`, honoring the entry's TTL (or the default).
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.lookup(key, None)
    }

    /// Looks up `key` with a TTL override that takes precedence over both the
    /// entry's stored TTL and the configured default.
    pub fn get_with_ttl(&mut self, key: &str, ttl: Duration) -> Option<&V> {
        self.lookup(key, Some(ttl))
    }

    /// Removes `key`; returns whether an entry existed.
    pub fn evict(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.evictions += 1;
        }
        removed
    }

    /// Removes every entry whose key matches `pattern`; returns the count.
    pub fn evict_pattern(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        let removed = before - self.entries.len();
        self.evictions += removed as u64;
        removed
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.evictions += self.entries.len() as u64;
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters and bounds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            total_entries: self.entries.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
            max_entries: self.config.max_entries,
        }
    }

    /// Runs a cleanup sweep unconditionally: expired entries are removed
    /// first, then the oldest entries until the store is at or under
    /// `max_entries`.
    pub fn cleanup_now(&mut self) {
        let before = self.entries.len();
        let default_ttl = self.config.default_ttl;
        self.entries
            .retain(|_, entry| entry.is_live(None, default_ttl));

        if self.entries.len() > self.config.max_entries {
            // Snapshot sort of all timestamps; acceptable at the bounded scale.
            let mut stamped: Vec<(String, Instant)> = self
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.inserted_at))
                .collect();
            stamped.sort_by_key(|(_, inserted_at)| *inserted_at);

            let excess = self.entries.len() - self.config.max_entries;
            for (key, _) in stamped.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let removed = before - self.entries.len();
        self.evictions += removed as u64;
        self.last_cleanup = Instant::now();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "cache cleanup");
        }
    }

    fn insert(&mut self, key: String, value: V, ttl: Option<Duration>) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        self.maybe_cleanup();
    }

    fn lookup(&mut self, key: &str, override_ttl: Option<Duration>) -> Option<&V> {
        let live = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.is_live(override_ttl, self.config.default_ttl),
        };

        if live {
            self.hits += 1;
            self.entries.get(key).map(|entry| &entry.value)
        } else {
            self.entries.remove(key);
            self.evictions += 1;
            self.misses += 1;
            None
        }
    }

    fn maybe_cleanup(&mut self) {
        if self.entries.len() <= self.config.max_entries {
            return;
        }
        if self.last_cleanup.elapsed() < self.config.cleanup_interval {
            return;
        }
        self.cleanup_now();
    }
}
