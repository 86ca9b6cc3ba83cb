//! Monorepo root detection.

use monoenv_cache::{CacheConfig, CacheStats, TtlCache};
use monoenv_core::{DetectionInfo, DetectionOutcome, Error, Result};
use monoenv_providers::MonorepoProvider;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// TTL for cached negative results.
///
/// Shorter than the provider-defined positive TTL so that a marker file
/// appearing later (e.g. after a `git checkout`) is picked up without
/// re-walking the filesystem on every query in between. A tunable default,
/// not a load-bearing constant.
pub const NEGATIVE_DETECTION_TTL: Duration = Duration::from_secs(60);

/// Hard bound on upward walk iterations; prevents runaway walks on malformed
/// paths or symlink cycles.
const MAX_WALK_STEPS: usize = 10;

struct RegisteredProvider {
    provider: Arc<dyn MonorepoProvider>,
    owner: Option<String>,
}

/// Registry snapshot returned by [`DetectionRegistry::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    /// Number of registered providers.
    pub provider_count: usize,
    /// Registered provider names in priority order.
    pub providers: Vec<String>,
    /// Detection cache counters.
    pub cache: CacheStats,
}

/// Priority-sorted provider registry with cached upward root detection.
///
/// Detection never raises: "no monorepo here" is the common case and comes
/// back as `None`, cached under a short negative TTL. Registration, by
/// contrast, fails hard on contract violations (empty or duplicate names) so
/// a broken provider never enters the registry.
pub struct DetectionRegistry {
    providers: Vec<RegisteredProvider>,
    cache: TtlCache<Option<DetectionOutcome>>,
}

impl DetectionRegistry {
    /// Creates an empty registry whose cache uses the given bounds.
    #[must_use]
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            providers: Vec::new(),
            cache: TtlCache::new(cache_config),
        }
    }

    /// Registers a provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderContract`] for an empty name and
    /// [`Error::DuplicateProvider`] when the name is taken.
    pub fn register_provider(&mut self, provider: Arc<dyn MonorepoProvider>) -> Result<()> {
        self.register_tagged(provider, None)
    }

    /// Registers a provider under an ownership tag, allowing the plugin
    /// system to remove exactly its own providers later.
    ///
    /// # Errors
    ///
    /// Same contract as [`register_provider`](Self::register_provider).
    pub fn register_owned(&mut self, provider: Arc<dyn MonorepoProvider>, owner: &str) -> Result<()> {
        self.register_tagged(provider, Some(owner.to_string()))
    }

    fn register_tagged(
        &mut self,
        provider: Arc<dyn MonorepoProvider>,
        owner: Option<String>,
    ) -> Result<()> {
        let name = provider.name().to_string();
        if name.trim().is_empty() {
            return Err(Error::ProviderContract {
                name,
                message: "name must not be empty".to_string(),
            });
        }
        if self.providers.iter().any(|r| r.provider.name() == name) {
            return Err(Error::DuplicateProvider { name });
        }

        tracing::debug!(provider = %name, priority = provider.priority(), "registering provider");
        self.providers.push(RegisteredProvider { provider, owner });
        self.providers
            .sort_by_key(|r| (r.provider.priority(), r.provider.name().to_string()));
        Ok(())
    }

    /// Removes a provider by name; returns whether one was removed.
    pub fn unregister_provider(&mut self, name: &str) -> bool {
        let before = self.providers.len();
        self.providers.retain(|r| r.provider.name() != name);
        before != self.providers.len()
    }

    /// Removes every provider registered under `owner`; returns their names.
    pub fn unregister_owner(&mut self, owner: &str) -> Vec<String> {
        let mut removed = Vec::new();
        self.providers.retain(|r| {
            if r.owner.as_deref() == Some(owner) {
                removed.push(r.provider.name().to_string());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Looks up a registered provider by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<Arc<dyn MonorepoProvider>> {
        self.providers
            .iter()
            .find(|r| r.provider.name() == name)
            .map(|r| Arc::clone(&r.provider))
    }

    /// Registered provider names in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|r| r.provider.name().to_string())
            .collect()
    }

    /// Whether no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Walks upward from `path` looking for a monorepo root.
    ///
    /// At each directory, providers are consulted in ascending priority
    /// order; the first one reporting a confidence above zero wins (ties
    /// break by priority, not confidence magnitude). A match is cached under
    /// the queried path and every intermediate path checked during the walk,
    /// so later queries from nested files resolve without touching the
    /// filesystem. A miss is cached the same way under
    /// [`NEGATIVE_DETECTION_TTL`].
    pub fn detect_monorepo(&mut self, path: &Path) -> Option<DetectionOutcome> {
        let start = normalize_start(path);
        let key = detection_key(&start);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        if self.providers.is_empty() {
            tracing::debug!("no providers registered; skipping detection walk");
            return None;
        }

        let (checked, matched) = self.walk(&start, None);
        self.record(&checked, matched)
    }

    /// Like [`detect_monorepo`](Self::detect_monorepo) but consults only the
    /// named provider. Results are cached under a provider-qualified key.
    pub fn detect_with_provider(&mut self, name: &str, path: &Path) -> Option<DetectionOutcome> {
        let start = normalize_start(path);
        let key = format!("detection:{name}:{}", start.display());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        self.provider(name)?;

        let (checked, matched) = self.walk(&start, Some(name));
        let ttl = matched.as_ref().map_or(NEGATIVE_DETECTION_TTL, |(provider, _)| {
            provider.cache_ttl()
        });
        let outcome = matched.map(|(_, outcome)| outcome);
        for dir in &checked {
            self.cache.set_with_ttl(
                format!("detection:{name}:{}", dir.display()),
                outcome.clone(),
                ttl,
            );
        }
        outcome
    }

    /// Drops all cached detection results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Detection cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Registry snapshot including cache counters.
    #[must_use]
    pub fn stats(&self) -> DetectionStats {
        DetectionStats {
            provider_count: self.providers.len(),
            providers: self.provider_names(),
            cache: self.cache.stats(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn walk(
        &self,
        start: &Path,
        only: Option<&str>,
    ) -> (
        Vec<PathBuf>,
        Option<(Arc<dyn MonorepoProvider>, DetectionOutcome)>,
    ) {
        let mut checked = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start.to_path_buf();

        for _ in 0..MAX_WALK_STEPS {
            if !visited.insert(current.clone()) {
                // Cycle guard: this directory was already checked in this walk.
                break;
            }
            checked.push(current.clone());

            for registered in &self.providers {
                if only.is_some_and(|name| registered.provider.name() != name) {
                    continue;
                }
                let detection = registered.provider.detect(&current);
                if detection.is_match() {
                    let outcome = DetectionOutcome {
                        root: current.clone(),
                        provider_name: registered.provider.name().to_string(),
                        info: DetectionInfo {
                            confidence: detection.confidence,
                            metadata: detection.metadata,
                            detected_at: SystemTime::now(),
                        },
                    };
                    tracing::debug!(
                        root = %outcome.root.display(),
                        provider = %outcome.provider_name,
                        confidence = outcome.info.confidence,
                        "monorepo root detected"
                    );
                    return (checked, Some((Arc::clone(&registered.provider), outcome)));
                }
            }

            match current.parent() {
                Some(parent) if parent != current => current = parent.to_path_buf(),
                _ => break,
            }
        }

        (checked, None)
    }

    fn record(
        &mut self,
        checked: &[PathBuf],
        matched: Option<(Arc<dyn MonorepoProvider>, DetectionOutcome)>,
    ) -> Option<DetectionOutcome> {
        match matched {
            Some((provider, outcome)) => {
                let ttl = provider.cache_ttl();
                for dir in checked {
                    self.cache
                        .set_with_ttl(detection_key(dir), Some(outcome.clone()), ttl);
                }
                Some(outcome)
            }
            None => {
                for dir in checked {
                    self.cache
                        .set_with_ttl(detection_key(dir), None, NEGATIVE_DETECTION_TTL);
                }
                None
            }
        }
    }
}

fn detection_key(path: &Path) -> String {
    format!("detection:{}", path.display())
}

/// Normalizes the starting point to an absolute directory; files resolve to
/// their parent. A path that does not exist is treated as a directory, so
/// detection still walks upward from it.
fn normalize_start(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    if absolute.is_file()
        && let Some(parent) = absolute.parent()
    {
        return parent.to_path_buf();
    }
    absolute
}
