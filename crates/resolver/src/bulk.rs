//! Batched filesystem resolution.
//!
//! Resolving N directories against M patterns naively issues N×M separate
//! globs, and workspace validation stats the same marker files repeatedly
//! within one resolution pass. [`BulkResolver`] batches both: every
//! `(directory, pattern)` search runs once, results are re-bucketed by parent
//! directory in a single decomposition pass, and file-existence checks go
//! through a short-lived cache.

use monoenv_cache::{CacheConfig, TtlCache};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// TTL of the file-existence cache: long enough to amortize one resolution
/// burst, short enough that a created marker file is seen promptly.
pub const EXISTENCE_TTL: Duration = Duration::from_secs(5);

/// Batches glob and file-existence operations across many directories.
#[derive(Debug)]
pub struct BulkResolver {
    existence: TtlCache<bool>,
}

impl Default for BulkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkResolver {
    /// Creates a bulk resolver with its own short-lived existence cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            existence: TtlCache::new(CacheConfig {
                max_entries: 4096,
                default_ttl: EXISTENCE_TTL,
                cleanup_interval: EXISTENCE_TTL,
            }),
        }
    }

    /// Globs `patterns` under every directory in `dirs` and returns the
    /// matching files bucketed by parent directory.
    ///
    /// Each distinct `(dir, pattern)` search string is globbed exactly once;
    /// the flat result list is re-bucketed in a single path-decomposition
    /// pass, deduplicated, and each bucket is sorted by name afterwards.
    /// Every requested directory is present in the result, with an empty
    /// bucket when nothing matched (a missing directory yields zero matches,
    /// never an error).
    pub fn bulk_resolve_env_files(
        &mut self,
        dirs: &[PathBuf],
        patterns: &[String],
    ) -> HashMap<PathBuf, Vec<PathBuf>> {
        let mut searches = Vec::new();
        let mut seen_searches = HashSet::new();
        for dir in dirs {
            let escaped = glob::Pattern::escape(&dir.to_string_lossy());
            for pattern in patterns {
                let search = format!("{escaped}/{pattern}");
                if seen_searches.insert(search.clone()) {
                    searches.push(search);
                }
            }
        }

        let mut flat = Vec::new();
        for search in &searches {
            match glob::glob(search) {
                Ok(matches) => {
                    flat.extend(
                        matches
                            .filter_map(std::result::Result::ok)
                            .filter(|path| path.is_file()),
                    );
                }
                Err(error) => {
                    tracing::warn!(pattern = %search, %error, "invalid env-file pattern; skipping");
                }
            }
        }

        let mut buckets: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for dir in dirs {
            buckets.entry(dir.clone()).or_default();
        }
        let mut seen_files = HashSet::new();
        for file in flat {
            if !seen_files.insert(file.clone()) {
                continue;
            }
            if let Some(parent) = file.parent() {
                buckets.entry(parent.to_path_buf()).or_default().push(file);
            }
        }

        for files in buckets.values_mut() {
            files.sort();
        }
        buckets
    }

    /// Checks existence of many files at once through the short-lived cache.
    pub fn batch_file_exists(&mut self, paths: &[PathBuf]) -> HashMap<PathBuf, bool> {
        let mut result = HashMap::with_capacity(paths.len());
        for path in paths {
            if result.contains_key(path) {
                continue;
            }
            let key = format!("exists:{}", path.display());
            let exists = match self.existence.get(&key) {
                Some(cached) => *cached,
                None => {
                    let fresh = path.is_file();
                    self.existence.set(key, fresh);
                    fresh
                }
            };
            result.insert(path.clone(), exists);
        }
        result
    }

    /// Counters for the existence cache.
    #[must_use]
    pub fn existence_stats(&self) -> monoenv_cache::CacheStats {
        self.existence.stats()
    }

    /// Drops all cached existence results.
    pub fn clear_cache(&mut self) {
        self.existence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn patterns(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn results_are_bucketed_by_parent_directory() {
        let dir = TempDir::new().unwrap();
        let ws = dir.path().join("apps/web");
        fs::create_dir_all(&ws).unwrap();
        fs::write(dir.path().join(".env"), "A=1").unwrap();
        fs::write(ws.join(".env"), "B=2").unwrap();
        fs::write(ws.join(".env.local"), "C=3").unwrap();

        let dirs = vec![dir.path().to_path_buf(), ws.clone()];
        let buckets =
            BulkResolver::new().bulk_resolve_env_files(&dirs, &patterns(&[".env", ".env.*"]));

        assert_eq!(buckets[dir.path()], vec![dir.path().join(".env")]);
        assert_eq!(buckets[&ws], vec![ws.join(".env"), ws.join(".env.local")]);
    }

    #[test]
    fn missing_directory_yields_empty_bucket() {
        let dirs = vec![PathBuf::from("/nonexistent/workspace")];
        let buckets = BulkResolver::new().bulk_resolve_env_files(&dirs, &patterns(&[".env"]));

        assert_eq!(buckets[&dirs[0]], Vec::<PathBuf>::new());
    }

    #[test]
    fn overlapping_patterns_deduplicate_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env.local"), "A=1").unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        let buckets = BulkResolver::new()
            .bulk_resolve_env_files(&dirs, &patterns(&[".env.*", ".env.local"]));

        assert_eq!(buckets[dir.path()].len(), 1);
    }

    #[test]
    fn directories_matching_patterns_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".env.d")).unwrap();
        fs::write(dir.path().join(".env"), "A=1").unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        let buckets =
            BulkResolver::new().bulk_resolve_env_files(&dirs, &patterns(&[".env", ".env.*"]));

        assert_eq!(buckets[dir.path()], vec![dir.path().join(".env")]);
    }

    #[test]
    fn batch_file_exists_caches_results() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("package.json");
        let absent = dir.path().join("Cargo.toml");
        fs::write(&present, "{}").unwrap();

        let mut resolver = BulkResolver::new();
        let paths = vec![present.clone(), absent.clone()];

        let first = resolver.batch_file_exists(&paths);
        assert!(first[&present]);
        assert!(!first[&absent]);

        // Second call within the TTL is served from the cache.
        let _ = resolver.batch_file_exists(&paths);
        let stats = resolver.existence_stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn glob_metacharacters_in_directory_names_are_escaped() {
        let dir = TempDir::new().unwrap();
        let odd = dir.path().join("apps/[web]");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join(".env"), "A=1").unwrap();

        let dirs = vec![odd.clone()];
        let buckets = BulkResolver::new().bulk_resolve_env_files(&dirs, &patterns(&[".env"]));

        assert_eq!(buckets[&odd], vec![odd.join(".env")]);
    }
}
