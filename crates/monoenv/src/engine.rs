//! The engine facade wiring detection, discovery, resolution, and plugins.

use crate::manager::{WorkspaceListener, WorkspaceManager};
use monoenv_cache::{CacheConfig, CacheStats};
use monoenv_core::{CacheSettings, DetectionOutcome, Result, Settings, Workspace};
use monoenv_plugins::{HookContext, HookFn, HookPoint, PluginConfig, PluginSystem};
use monoenv_providers::{ConfiguredProvider, MonorepoProvider, builtin_by_name};
use monoenv_resolver::{
    DetectionRegistry, EnvironmentResolver, ResolveOptions, WorkspaceFinder,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Aggregate statistics over the registry and every cache namespace.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Registered provider names in priority order.
    pub providers: Vec<String>,
    /// Detection-result cache counters.
    pub detection: CacheStats,
    /// Workspace-list cache counters.
    pub workspaces: CacheStats,
    /// Env-file-list cache counters.
    pub env_files: CacheStats,
}

/// The monoenv engine.
///
/// Owns the provider registry, the three cache-backed resolution stages, the
/// plugin system, and the workspace manager. Constructed once from validated
/// [`Settings`] and passed by handle into every call site; there is no global
/// state. The engine is single-threaded cooperative: wrap it in external
/// synchronization before sharing it across threads.
pub struct Engine {
    settings: Settings,
    registry: DetectionRegistry,
    finder: WorkspaceFinder,
    resolver: EnvironmentResolver,
    plugins: PluginSystem,
    manager: WorkspaceManager,
}

impl Engine {
    /// Builds an engine from settings.
    ///
    /// Settings are validated first; the configured builtin providers and
    /// custom provider specs are then registered. Both steps fail hard: a
    /// broken configuration or provider indicates a broken integration and
    /// must be fixed before the engine becomes usable.
    ///
    /// # Errors
    ///
    /// Returns [`monoenv_core::Error::InvalidConfig`] for schema or range
    /// violations and registration errors for broken provider specs.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let cache_config = cache_config_from(&settings.performance.cache);

        let mut registry = DetectionRegistry::new(cache_config.clone());
        let mut registered = HashSet::new();
        for name in &settings.providers.builtin {
            if !registered.insert(name.clone()) {
                continue;
            }
            if let Some(provider) = builtin_by_name(name) {
                registry.register_provider(provider)?;
            }
        }
        for spec in &settings.providers.custom {
            let provider = ConfiguredProvider::from_spec(spec.clone())?;
            registry.register_provider(Arc::new(provider))?;
        }

        let manager = WorkspaceManager::new(&settings.performance.auto_switch_throttle);
        Ok(Self {
            registry,
            finder: WorkspaceFinder::new(cache_config.clone()),
            resolver: EnvironmentResolver::new(cache_config),
            plugins: PluginSystem::new(),
            manager,
            settings,
        })
    }

    /// The validated settings this engine runs with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Detects the monorepo root governing `path`.
    ///
    /// Fires the `before_detection`/`after_detection` hooks around the walk.
    /// Returns `None` when the engine is disabled or no provider recognizes
    /// any ancestor directory, which is a normal outcome rather than an error.
    pub fn detect_monorepo_root(&mut self, path: &Path) -> Option<DetectionOutcome> {
        if !self.settings.enabled {
            return None;
        }
        self.plugins.call_hooks(
            HookPoint::BeforeDetection,
            &HookContext::for_detection(path.to_path_buf()),
        );
        let outcome = self.registry.detect_monorepo(path);
        self.plugins.call_hooks(
            HookPoint::AfterDetection,
            &HookContext::for_detection_result(path.to_path_buf(), outcome.clone()),
        );
        outcome
    }

    /// Discovers the workspaces of the named provider under `root`.
    pub fn get_workspaces(&mut self, root: &Path, provider_name: &str) -> Vec<Workspace> {
        if !self.settings.enabled {
            return Vec::new();
        }
        let Some(provider) = self.registry.provider(provider_name) else {
            return Vec::new();
        };
        self.finder.find_workspaces(root, provider.as_ref(), None)
    }

    /// Discovers workspaces for a detection outcome, reusing its metadata to
    /// refine the provider's glob patterns.
    pub fn workspaces_for(&mut self, outcome: &DetectionOutcome) -> Vec<Workspace> {
        if !self.settings.enabled {
            return Vec::new();
        }
        let Some(provider) = self.registry.provider(&outcome.provider_name) else {
            return Vec::new();
        };
        self.finder.find_workspaces(
            &outcome.root,
            provider.as_ref(),
            outcome.info.metadata.as_ref(),
        )
    }

    /// Picks the workspace containing `file`: the deepest workspace whose
    /// path is a prefix of the file path, or `None`.
    #[must_use]
    pub fn find_current_workspace(file: &Path, workspaces: &[Workspace]) -> Option<Workspace> {
        workspaces
            .iter()
            .filter(|workspace| workspace.contains(file))
            .max_by_key(|workspace| workspace.path.components().count())
            .cloned()
    }

    /// Resolves the ordered environment-file list for a workspace under the
    /// named provider's strategy.
    pub fn resolve_env_files(
        &mut self,
        workspace: Option<&Workspace>,
        root: &Path,
        provider_name: &str,
        patterns: Option<&[String]>,
        opts: &ResolveOptions,
    ) -> Vec<PathBuf> {
        if !self.settings.enabled {
            return Vec::new();
        }
        let Some(provider) = self.registry.provider(provider_name) else {
            return Vec::new();
        };
        self.resolver
            .resolve_env_files(workspace, root, provider.as_ref(), patterns, opts)
    }

    /// Resolves environment files across many workspaces in one batched pass.
    pub fn resolve_all_workspace_files(
        &mut self,
        workspaces: &[Workspace],
        root: &Path,
        provider_name: &str,
        patterns: Option<&[String]>,
        opts: &ResolveOptions,
    ) -> Vec<PathBuf> {
        if !self.settings.enabled {
            return Vec::new();
        }
        let Some(provider) = self.registry.provider(provider_name) else {
            return Vec::new();
        };
        self.resolver
            .resolve_all_workspace_files(workspaces, root, provider.as_ref(), patterns, opts)
    }

    /// Registers an additional provider.
    ///
    /// # Errors
    ///
    /// Propagates the registry's provider-contract errors.
    pub fn register_provider(&mut self, provider: Arc<dyn MonorepoProvider>) -> Result<()> {
        self.registry.register_provider(provider)
    }

    /// Removes a provider by name; returns whether one was removed.
    pub fn unregister_provider(&mut self, name: &str) -> bool {
        self.registry.unregister_provider(name)
    }

    /// Registers a plugin: its providers and hooks in one bundle.
    ///
    /// # Errors
    ///
    /// Propagates plugin-conflict and provider-contract errors.
    pub fn register_plugin(&mut self, config: PluginConfig) -> Result<()> {
        self.plugins.register_plugin(&mut self.registry, config)
    }

    /// Removes a plugin, its providers, and its hooks.
    pub fn unregister_plugin(&mut self, name: &str) -> bool {
        self.plugins.unregister_plugin(&mut self.registry, name)
    }

    /// Registers a standalone lifecycle hook.
    pub fn register_hook(&mut self, point: HookPoint, hook: HookFn) {
        self.plugins.register_hook(point, hook, None);
    }

    /// The workspace manager (current workspace, change listeners).
    #[must_use]
    pub fn workspace_manager(&self) -> &WorkspaceManager {
        &self.manager
    }

    /// Registers a workspace-change listener; returns its id.
    pub fn on_workspace_change(&mut self, listener: WorkspaceListener) -> u64 {
        self.manager.on_change(listener)
    }

    /// Removes a workspace-change listener by id.
    pub fn remove_workspace_listener(&mut self, id: u64) -> bool {
        self.manager.remove_listener(id)
    }

    /// Switches the current workspace, firing switch hooks and listeners.
    ///
    /// A no-op (returning `false`) when `workspace` is already current;
    /// workspace identity is the absolute path.
    pub fn switch_workspace(&mut self, workspace: Option<Workspace>) -> bool {
        if !self.manager.would_change(workspace.as_ref()) {
            return false;
        }
        let previous = self.manager.current().cloned();
        self.plugins.call_hooks(
            HookPoint::BeforeWorkspaceSwitch,
            &HookContext::for_switch(previous.clone(), workspace.clone()),
        );
        self.manager
            .set_current(workspace.clone(), self.settings.notify_on_switch);
        self.plugins.call_hooks(
            HookPoint::AfterWorkspaceSwitch,
            &HookContext::for_switch(previous, workspace),
        );
        true
    }

    /// Runs the full auto-switch flow for a visited file: detect the root,
    /// discover workspaces, pick the containing one, and switch to it under
    /// the configured throttle. Returns the workspace now current.
    pub fn auto_switch_for_file(&mut self, file: &Path) -> Option<Workspace> {
        if !self.settings.enabled || !self.settings.auto_switch {
            return self.manager.current().cloned();
        }
        if !self.manager.throttle_admit() {
            tracing::trace!(file = %file.display(), "auto-switch deferred by throttle");
            return self.manager.current().cloned();
        }

        let target = match self.detect_monorepo_root(file) {
            Some(outcome) => {
                let workspaces = self.workspaces_for(&outcome);
                Self::find_current_workspace(file, &workspaces)
            }
            None => None,
        };
        self.switch_workspace(target.clone());
        target
    }

    /// Aggregate registry and cache statistics.
    #[must_use]
    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            providers: self.registry.provider_names(),
            detection: self.registry.cache_stats(),
            workspaces: self.finder.cache_stats(),
            env_files: self.resolver.cache_stats(),
        }
    }

    /// Drops every cached detection, workspace, and env-file result.
    pub fn clear_cache(&mut self) {
        self.registry.clear_cache();
        self.finder.clear_cache();
        self.resolver.clear_cache();
    }
}

fn cache_config_from(settings: &CacheSettings) -> CacheConfig {
    CacheConfig {
        max_entries: settings.max_entries,
        default_ttl: Duration::from_millis(settings.default_ttl_ms),
        cleanup_interval: Duration::from_millis(settings.cleanup_interval_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn workspace(path: &str) -> Workspace {
        Workspace::from_root(Path::new("/repo"), PathBuf::from(path), "turborepo").unwrap()
    }

    #[test]
    fn default_settings_register_all_builtins() {
        let engine = Engine::new(Settings::default()).unwrap();
        let stats = engine.get_stats();

        assert_eq!(
            stats.providers,
            vec![
                "turborepo",
                "nx",
                "lerna",
                "cargo_workspaces",
                "yarn_workspaces"
            ]
        );
    }

    #[test]
    fn builtin_subset_is_respected() {
        let mut settings = Settings::default();
        settings.providers.builtin = vec!["turborepo".to_string(), "nx".to_string()];

        let engine = Engine::new(settings).unwrap();
        assert_eq!(engine.get_stats().providers, vec!["turborepo", "nx"]);
    }

    #[test]
    fn invalid_settings_fail_construction() {
        let mut settings = Settings::default();
        settings.performance.cache.max_entries = 1;

        assert!(Engine::new(settings).is_err());
    }

    #[test]
    fn find_current_workspace_picks_deepest_match() {
        let workspaces = vec![
            workspace("/repo/apps"),
            workspace("/repo/apps/web"),
            workspace("/repo/packages/ui"),
        ];

        let found =
            Engine::find_current_workspace(Path::new("/repo/apps/web/src/index.ts"), &workspaces)
                .unwrap();
        assert_eq!(found.path, PathBuf::from("/repo/apps/web"));

        assert!(
            Engine::find_current_workspace(Path::new("/elsewhere/file.ts"), &workspaces).is_none()
        );
    }

    #[test]
    fn disabled_engine_answers_empty() {
        let mut settings = Settings::default();
        settings.enabled = false;
        let mut engine = Engine::new(settings).unwrap();

        assert!(engine.detect_monorepo_root(Path::new("/repo")).is_none());
        assert!(engine.get_workspaces(Path::new("/repo"), "turborepo").is_empty());
        assert!(
            engine
                .resolve_env_files(
                    None,
                    Path::new("/repo"),
                    "turborepo",
                    None,
                    &ResolveOptions::default()
                )
                .is_empty()
        );
    }

    #[test]
    fn unknown_provider_name_yields_empty_results() {
        let mut engine = Engine::new(Settings::default()).unwrap();
        assert!(engine.get_workspaces(Path::new("/repo"), "bazel").is_empty());
    }

    #[test]
    fn switch_workspace_is_idempotent_per_path() {
        let mut engine = Engine::new(Settings::default()).unwrap();

        assert!(engine.switch_workspace(Some(workspace("/repo/apps/web"))));
        assert!(!engine.switch_workspace(Some(workspace("/repo/apps/web"))));
        assert!(engine.switch_workspace(None));
    }
}
