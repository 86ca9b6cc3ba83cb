//! TTL- and size-bounded in-memory caching for monoenv.
//!
//! Every layer of the resolution pipeline (detection results, workspace
//! lists, resolved env-file lists) caches through the same primitive:
//! [`TtlCache`], a string-keyed store with per-entry timestamps, hit/miss
//! accounting, regex-based eviction, and an opportunistic two-phase cleanup
//! (expired entries first, then oldest-by-timestamp down to the entry bound).
//!
//! The store is deliberately synchronous and lock-free: the engine is
//! single-threaded cooperative, and callers that need cross-thread access
//! must wrap their cache handle in external synchronization.
//!
//! # Example
//!
//! ```
//! use monoenv_cache::{CacheConfig, TtlCache};
//! use std::time::Duration;
//!
//! let mut cache = TtlCache::new(CacheConfig::default());
//! cache.set("detection:/repo", "turborepo");
//!
//! assert_eq!(cache.get("detection:/repo"), Some(&"turborepo"));
//! assert_eq!(cache.get_with_ttl("detection:/repo", Duration::ZERO), None);
//! ```

mod store;

pub use store::{CacheConfig, CacheStats, TtlCache};
