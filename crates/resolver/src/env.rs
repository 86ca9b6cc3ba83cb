//! Environment-file resolution strategies.

use crate::bulk::BulkResolver;
use monoenv_cache::{CacheConfig, CacheStats, TtlCache};
use monoenv_core::{EnvScope, ResolutionStrategy, Workspace};
use monoenv_providers::MonorepoProvider;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Patterns searched when the caller supplies none.
pub const DEFAULT_ENV_PATTERNS: [&str; 3] = [".env", ".envrc", ".env.*"];

/// Caller-supplied ordering for resolved files.
pub type EnvFileComparator = Arc<dyn Fn(&Path, &Path) -> Ordering + Send + Sync>;

/// Options refining the order of resolved environment files.
#[derive(Clone, Default)]
pub struct ResolveOptions {
    /// Files whose name ends in `.<preferred_environment>` are hoisted before
    /// the others; the rest keep their relative order.
    pub preferred_environment: Option<String>,
    /// Full custom ordering. Takes precedence over `preferred_environment`
    /// and bypasses the result cache (a closure cannot participate in a
    /// cache key).
    pub comparator: Option<EnvFileComparator>,
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("preferred_environment", &self.preferred_environment)
            .field("comparator", &self.comparator.as_ref().map(|_| "Fn(..)"))
            .finish()
    }
}

impl ResolveOptions {
    /// Options hoisting files that end in `.<environment>`.
    #[must_use]
    pub fn preferring(environment: impl Into<String>) -> Self {
        Self {
            preferred_environment: Some(environment.into()),
            comparator: None,
        }
    }
}

/// Resolves the ordered list of environment files applying to a location.
///
/// The actual globbing is delegated to the [`BulkResolver`], which batches
/// every `(directory, pattern)` combination in one pass; this type only
/// decides *which* directories participate and in *what order*, per the
/// provider's [`ResolutionStrategy`].
#[derive(Debug)]
pub struct EnvironmentResolver {
    cache: TtlCache<Vec<PathBuf>>,
    bulk: BulkResolver,
}

impl EnvironmentResolver {
    /// Creates a resolver whose cache uses the given bounds.
    #[must_use]
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::new(cache_config),
            bulk: BulkResolver::new(),
        }
    }

    /// Resolves the environment files for `workspace` (or none) under `root`.
    ///
    /// Returns ordered, deduplicated absolute paths. Earlier entries win when
    /// the consumer applies first-match-wins semantics. A directory that does
    /// not exist yields zero matches; no runtime condition is an error.
    pub fn resolve_env_files(
        &mut self,
        workspace: Option<&Workspace>,
        root: &Path,
        provider: &dyn MonorepoProvider,
        patterns: Option<&[String]>,
        opts: &ResolveOptions,
    ) -> Vec<PathBuf> {
        let patterns = effective_patterns(patterns);
        let cacheable = opts.comparator.is_none();
        let key = cache_key(provider.name(), root, workspace, &patterns, opts);
        if cacheable
            && let Some(cached) = self.cache.get(&key)
        {
            return cached.clone();
        }

        let resolution = provider.env_resolution();
        let workspace_dir = workspace.map(|w| w.path.clone());
        let search_dirs = ordered_search_dirs(
            &resolution.strategy,
            resolution.inheritance,
            &resolution.override_order,
            workspace_dir.as_deref(),
            root,
        );

        let files = if search_dirs.is_empty() {
            Vec::new()
        } else {
            let buckets = self.bulk.bulk_resolve_env_files(&search_dirs, &patterns);
            let mut files = Vec::new();
            let mut seen = HashSet::new();
            for dir in &search_dirs {
                if let Some(bucket) = buckets.get(dir) {
                    for file in bucket {
                        if seen.insert(file.clone()) {
                            files.push(file.clone());
                        }
                    }
                }
            }
            apply_ordering(&mut files, opts);
            files
        };

        tracing::debug!(
            provider = provider.name(),
            strategy = resolution.strategy.as_str(),
            count = files.len(),
            "environment files resolved"
        );
        if cacheable {
            self.cache
                .set_with_ttl(key, files.clone(), provider.cache_ttl());
        }
        files
    }

    /// Resolves environment files across many workspaces in one batched pass.
    ///
    /// Equivalent to concatenating `resolve_env_files` over `workspaces` in
    /// order (then deduplicating), but every directory is globbed in a single
    /// bulk operation instead of once per workspace.
    pub fn resolve_all_workspace_files(
        &mut self,
        workspaces: &[Workspace],
        root: &Path,
        provider: &dyn MonorepoProvider,
        patterns: Option<&[String]>,
        opts: &ResolveOptions,
    ) -> Vec<PathBuf> {
        let patterns = effective_patterns(patterns);
        let resolution = provider.env_resolution();

        let mut all_dirs: Vec<PathBuf> = Vec::new();
        let mut seen_dirs = HashSet::new();
        for workspace in workspaces {
            if seen_dirs.insert(workspace.path.clone()) {
                all_dirs.push(workspace.path.clone());
            }
        }
        if seen_dirs.insert(root.to_path_buf()) {
            all_dirs.push(root.to_path_buf());
        }

        let buckets = self.bulk.bulk_resolve_env_files(&all_dirs, &patterns);

        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut collect = |dirs: Vec<PathBuf>| {
            for dir in dirs {
                if let Some(bucket) = buckets.get(&dir) {
                    for file in bucket {
                        if seen.insert(file.clone()) {
                            files.push(file.clone());
                        }
                    }
                }
            }
        };

        if workspaces.is_empty() {
            collect(ordered_search_dirs(
                &resolution.strategy,
                resolution.inheritance,
                &resolution.override_order,
                None,
                root,
            ));
        } else {
            for workspace in workspaces {
                collect(ordered_search_dirs(
                    &resolution.strategy,
                    resolution.inheritance,
                    &resolution.override_order,
                    Some(&workspace.path),
                    root,
                ));
            }
        }

        apply_ordering(&mut files, opts);
        files
    }

    /// Env-file cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops all cached file lists and existence results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.bulk.clear_cache();
    }
}

fn effective_patterns(patterns: Option<&[String]>) -> Vec<String> {
    patterns.map_or_else(
        || DEFAULT_ENV_PATTERNS.iter().map(ToString::to_string).collect(),
        <[String]>::to_vec,
    )
}

/// The directories a strategy searches, in precedence order, deduplicated
/// (a workspace sitting at the root is searched once).
fn ordered_search_dirs(
    strategy: &ResolutionStrategy,
    inheritance: bool,
    override_order: &[EnvScope],
    workspace: Option<&Path>,
    root: &Path,
) -> Vec<PathBuf> {
    let ordered: Vec<PathBuf> = match strategy {
        ResolutionStrategy::WorkspaceOnly => {
            workspace.map(Path::to_path_buf).into_iter().collect()
        }
        ResolutionStrategy::WorkspaceFirst => {
            let mut dirs = Vec::new();
            if let Some(ws) = workspace {
                dirs.push(ws.to_path_buf());
            }
            if inheritance {
                dirs.push(root.to_path_buf());
            }
            dirs
        }
        ResolutionStrategy::RootFirst => {
            let mut dirs = vec![root.to_path_buf()];
            if let Some(ws) = workspace {
                dirs.push(ws.to_path_buf());
            }
            dirs
        }
        ResolutionStrategy::Merge => override_order
            .iter()
            .filter_map(|scope| match scope {
                EnvScope::Root => Some(root.to_path_buf()),
                EnvScope::Workspace => workspace.map(Path::to_path_buf),
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

fn apply_ordering(files: &mut Vec<PathBuf>, opts: &ResolveOptions) {
    if let Some(comparator) = &opts.comparator {
        files.sort_by(|a, b| comparator(a, b));
        return;
    }
    if let Some(preferred) = &opts.preferred_environment {
        let suffix = format!(".{preferred}");
        // Stable sort on a boolean key hoists preferred files while keeping
        // the relative order of everything else.
        files.sort_by_key(|file| {
            !file
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(&suffix))
        });
    }
}

fn cache_key(
    provider: &str,
    root: &Path,
    workspace: Option<&Workspace>,
    patterns: &[String],
    opts: &ResolveOptions,
) -> String {
    let workspace_part = workspace.map_or_else(
        || "no_workspace".to_string(),
        |w| w.path.display().to_string(),
    );
    format!(
        "env_files:{provider}:{}:{workspace_part}:{}:{}",
        root.display(),
        patterns.join(","),
        opts.preferred_environment.as_deref().unwrap_or("")
    )
}
