//! Workspace discovery under a detected monorepo root.

use crate::bulk::BulkResolver;
use crate::patterns::expand_workspace_patterns;
use monoenv_cache::{CacheConfig, CacheStats, TtlCache};
use monoenv_core::Workspace;
use monoenv_providers::MonorepoProvider;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Rank assigned to workspace types absent from the provider's priority list;
/// they sort after every listed type.
const UNLISTED_TYPE_RANK: usize = 999;

/// Expands a provider's workspace patterns into validated, ordered
/// [`Workspace`] records.
#[derive(Debug)]
pub struct WorkspaceFinder {
    cache: TtlCache<Vec<Workspace>>,
    bulk: BulkResolver,
}

impl WorkspaceFinder {
    /// Creates a finder whose cache uses the given bounds.
    #[must_use]
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::new(cache_config),
            bulk: BulkResolver::new(),
        }
    }

    /// Discovers the workspaces of `provider` under `root`.
    ///
    /// Glob patterns (refined with `detection_metadata` when the provider
    /// supports it) are expanded against the filesystem; each candidate
    /// directory is validated by depth and by the presence of one of the
    /// provider's package-manager marker files, deduplicated by path, and
    /// sorted by the provider's type priority, then by name. The final list
    /// is cached at the provider's TTL.
    pub fn find_workspaces(
        &mut self,
        root: &Path,
        provider: &dyn MonorepoProvider,
        detection_metadata: Option<&serde_json::Value>,
    ) -> Vec<Workspace> {
        let patterns = provider.dynamic_workspace_patterns(detection_metadata);
        if patterns.is_empty() {
            return Vec::new();
        }

        let key = format!("workspaces:{}:{}", provider.name(), root.display());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let candidates = expand_workspace_patterns(root, &patterns, provider.max_depth());
        let markers = provider.package_managers();
        let marker_paths: Vec<PathBuf> = candidates
            .iter()
            .flat_map(|dir| markers.iter().map(|marker| dir.join(marker)))
            .collect();
        let existence = self.bulk.batch_file_exists(&marker_paths);

        let mut seen = HashSet::new();
        let mut workspaces = Vec::new();
        for dir in candidates {
            if !seen.insert(dir.clone()) {
                continue;
            }
            let Some(mut workspace) = Workspace::from_root(root, dir, provider.name()) else {
                continue;
            };
            if workspace.depth > provider.max_depth() {
                tracing::trace!(
                    path = %workspace.path.display(),
                    depth = workspace.depth,
                    "workspace exceeds provider depth limit"
                );
                continue;
            }
            let has_marker = markers
                .iter()
                .any(|marker| existence.get(&workspace.path.join(marker)) == Some(&true));
            if !has_marker {
                tracing::debug!(
                    path = %workspace.path.display(),
                    "skipping directory without package-manager marker"
                );
                continue;
            }
            workspace.has_package_manager = true;
            workspaces.push(workspace);
        }

        let type_priority = provider.workspace_type_priority();
        workspaces.sort_by(|a, b| {
            type_rank(&type_priority, &a.ws_type)
                .cmp(&type_rank(&type_priority, &b.ws_type))
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::debug!(
            root = %root.display(),
            provider = provider.name(),
            count = workspaces.len(),
            "workspaces discovered"
        );
        self.cache
            .set_with_ttl(key, workspaces.clone(), provider.cache_ttl());
        workspaces
    }

    /// Workspace-list cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops all cached workspace lists and existence results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.bulk.clear_cache();
    }
}

fn type_rank(priority: &[String], ws_type: &str) -> usize {
    priority
        .iter()
        .position(|t| t == ws_type)
        .unwrap_or(UNLISTED_TYPE_RANK)
}
