//! The provider capability trait and its shared defaults.

use monoenv_core::{Detection, EnvResolution};
use std::path::Path;
use std::time::Duration;

/// Shared defaults composed by concrete providers.
pub mod defaults {
    use std::time::Duration;

    /// Detection cache TTL used by providers that don't override it.
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum workspace depth below the root.
    pub const MAX_DEPTH: usize = 4;

    /// Workspace-type sort order used by providers that don't override it.
    #[must_use]
    pub fn workspace_type_priority() -> Vec<String> {
        ["apps", "packages", "libs", "services", "tools"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// A monorepo build-tool flavor: how to recognize its root, where its
/// workspaces live, and how environment files resolve within it.
///
/// Implementations are immutable after construction; per-call state lives in
/// the [`Detection`] metadata they return. The trait supplies defaults for
/// everything except identity and detection, so a minimal provider only
/// implements `name`, `priority`, `detect`, and `workspace_patterns`.
pub trait MonorepoProvider: Send + Sync {
    /// Unique provider identifier.
    fn name(&self) -> &str;

    /// Detection priority; lower values are tried first. Common or ambiguous
    /// markers (a bare `package.json`, `Cargo.toml`) rank lower than
    /// tool-specific ones (`turbo.json`).
    fn priority(&self) -> u32;

    /// Asks whether `dir` is a monorepo root of this flavor.
    ///
    /// A confidence of zero means "not detected". Malformed marker files are
    /// recovered locally: the marker still counts, the parse bonus and
    /// metadata are simply omitted. This method never errors.
    fn detect(&self, dir: &Path) -> Detection;

    /// Glob patterns locating workspace directories under the root.
    fn workspace_patterns(&self) -> Vec<String>;

    /// Patterns refined with metadata from a prior [`detect`](Self::detect)
    /// call (e.g. a configured workspace layout). Defaults to the static
    /// patterns.
    fn dynamic_workspace_patterns(&self, metadata: Option<&serde_json::Value>) -> Vec<String> {
        let _ = metadata;
        self.workspace_patterns()
    }

    /// Environment-file resolution policy for this flavor.
    fn env_resolution(&self) -> EnvResolution {
        EnvResolution::default()
    }

    /// Package-manager marker files whose presence validates a workspace
    /// directory.
    fn package_managers(&self) -> Vec<String> {
        vec!["package.json".to_string()]
    }

    /// TTL applied to cached detection, workspace, and env-file results.
    fn cache_ttl(&self) -> Duration {
        defaults::CACHE_TTL
    }

    /// Maximum number of path segments a workspace may sit below the root.
    fn max_depth(&self) -> usize {
        defaults::MAX_DEPTH
    }

    /// Workspace-type names in sort priority order; unlisted types sort last.
    fn workspace_type_priority(&self) -> Vec<String> {
        defaults::workspace_type_priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monoenv_core::ResolutionStrategy;

    struct MinimalProvider;

    impl MonorepoProvider for MinimalProvider {
        fn name(&self) -> &str {
            "minimal"
        }

        fn priority(&self) -> u32 {
            7
        }

        fn detect(&self, _dir: &Path) -> Detection {
            Detection::not_found()
        }

        fn workspace_patterns(&self) -> Vec<String> {
            vec!["pkgs/*".to_string()]
        }
    }

    #[test]
    fn trait_defaults_apply_to_minimal_provider() {
        let provider = MinimalProvider;

        assert_eq!(provider.cache_ttl(), Duration::from_secs(300));
        assert_eq!(provider.max_depth(), 4);
        assert_eq!(provider.package_managers(), vec!["package.json"]);
        assert_eq!(
            provider.env_resolution().strategy,
            ResolutionStrategy::WorkspaceFirst
        );
        assert_eq!(
            provider.dynamic_workspace_patterns(None),
            vec!["pkgs/*".to_string()]
        );
    }
}
