//! Third-party extension without core modification.
//!
//! A plugin bundles zero-or-more providers (registered into the
//! [`DetectionRegistry`] under the plugin's ownership tag) and zero-or-more
//! callbacks for four lifecycle hook points. Ownership tagging is what makes
//! selective removal possible: unregistering a plugin strips exactly its
//! providers and hooks, leaving other plugins' registrations untouched.
//!
//! Hook invocation isolates each callback with its own failure boundary: one
//! hook failing is reported through tracing and does not prevent subsequent
//! hooks from running, nor does it abort the operation that triggered them.

use monoenv_core::{DetectionOutcome, Error, Result, Workspace};
use monoenv_providers::MonorepoProvider;
use monoenv_resolver::DetectionRegistry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle points a plugin can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before a detection walk starts.
    BeforeDetection,
    /// After a detection walk finishes (match or not).
    AfterDetection,
    /// Before the workspace manager switches workspaces.
    BeforeWorkspaceSwitch,
    /// After the workspace manager switched workspaces.
    AfterWorkspaceSwitch,
}

/// Context handed to every hook invocation.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Path being detected, for detection hooks.
    pub path: Option<PathBuf>,
    /// Detection result, for [`HookPoint::AfterDetection`].
    pub outcome: Option<DetectionOutcome>,
    /// Workspace being left, for switch hooks.
    pub previous: Option<Workspace>,
    /// Workspace being entered, for switch hooks.
    pub current: Option<Workspace>,
}

impl HookContext {
    /// Context for a detection that is about to run.
    #[must_use]
    pub fn for_detection(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    /// Context for a finished detection.
    #[must_use]
    pub fn for_detection_result(path: PathBuf, outcome: Option<DetectionOutcome>) -> Self {
        Self {
            path: Some(path),
            outcome,
            ..Self::default()
        }
    }

    /// Context for a workspace switch.
    #[must_use]
    pub fn for_switch(previous: Option<Workspace>, current: Option<Workspace>) -> Self {
        Self {
            previous,
            current,
            ..Self::default()
        }
    }
}

/// A hook callback. Failures are reported, never propagated.
pub type HookFn =
    Arc<dyn Fn(&HookContext) -> std::result::Result<(), Box<dyn std::error::Error>> + Send + Sync>;

struct HookEntry {
    owner: Option<String>,
    hook: HookFn,
}

/// A plugin declaration: a unique name plus provider and hook bundles.
pub struct PluginConfig {
    /// Unique plugin name; also the ownership tag for its registrations.
    pub name: String,
    /// Providers contributed by this plugin.
    pub providers: Vec<Arc<dyn MonorepoProvider>>,
    /// Hook callbacks contributed by this plugin.
    pub hooks: Vec<(HookPoint, HookFn)>,
}

impl PluginConfig {
    /// An empty plugin with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

/// Registry of plugins and their lifecycle hooks.
#[derive(Default)]
pub struct PluginSystem {
    plugins: Vec<String>,
    hooks: HashMap<HookPoint, Vec<HookEntry>>,
}

impl PluginSystem {
    /// Creates an empty plugin system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin: its providers enter `registry` under the plugin's
    /// ownership tag, its hooks join the hook table.
    ///
    /// Registration is atomic with respect to providers: when one of them
    /// fails the provider contract, the ones already registered are removed
    /// again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PluginConflict`] for a duplicate plugin name,
    /// [`Error::ProviderContract`] for a nameless plugin, and whatever
    /// [`DetectionRegistry::register_owned`] reports for broken providers.
    pub fn register_plugin(
        &mut self,
        registry: &mut DetectionRegistry,
        config: PluginConfig,
    ) -> Result<()> {
        if config.name.trim().is_empty() {
            return Err(Error::ProviderContract {
                name: config.name,
                message: "plugin name must not be empty".to_string(),
            });
        }
        if self.plugins.contains(&config.name) {
            return Err(Error::PluginConflict { name: config.name });
        }

        for provider in &config.providers {
            if let Err(error) = registry.register_owned(Arc::clone(provider), &config.name) {
                registry.unregister_owner(&config.name);
                return Err(error);
            }
        }

        for (point, hook) in config.hooks {
            self.register_hook(point, hook, Some(&config.name));
        }

        tracing::debug!(plugin = %config.name, "plugin registered");
        self.plugins.push(config.name);
        Ok(())
    }

    /// Removes a plugin, its providers, and its hooks; returns whether the
    /// plugin existed. Other plugins' registrations are unaffected.
    pub fn unregister_plugin(&mut self, registry: &mut DetectionRegistry, name: &str) -> bool {
        let Some(position) = self.plugins.iter().position(|p| p == name) else {
            return false;
        };
        self.plugins.remove(position);

        let removed_providers = registry.unregister_owner(name);
        for entries in self.hooks.values_mut() {
            entries.retain(|entry| entry.owner.as_deref() != Some(name));
        }

        tracing::debug!(
            plugin = name,
            providers = removed_providers.len(),
            "plugin unregistered"
        );
        true
    }

    /// Registers a standalone hook, optionally under an ownership tag.
    pub fn register_hook(&mut self, point: HookPoint, hook: HookFn, owner: Option<&str>) {
        self.hooks.entry(point).or_default().push(HookEntry {
            owner: owner.map(ToString::to_string),
            hook,
        });
    }

    /// Invokes every hook registered at `point`; returns how many ran.
    ///
    /// Each callback runs inside its own failure boundary: an error is logged
    /// and the remaining hooks still run.
    pub fn call_hooks(&self, point: HookPoint, context: &HookContext) -> usize {
        let Some(entries) = self.hooks.get(&point) else {
            return 0;
        };
        for entry in entries {
            if let Err(error) = (entry.hook)(context) {
                tracing::warn!(
                    ?point,
                    owner = entry.owner.as_deref().unwrap_or("<standalone>"),
                    %error,
                    "plugin hook failed; continuing with remaining hooks"
                );
            }
        }
        entries.len()
    }

    /// Number of hooks registered at `point`.
    #[must_use]
    pub fn hook_count(&self, point: HookPoint) -> usize {
        self.hooks.get(&point).map_or(0, Vec::len)
    }

    /// Names of registered plugins, in registration order.
    #[must_use]
    pub fn plugin_names(&self) -> &[String] {
        &self.plugins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monoenv_cache::CacheConfig;
    use monoenv_core::Detection;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider(&'static str);

    impl MonorepoProvider for StubProvider {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> u32 {
            8
        }

        fn detect(&self, _dir: &Path) -> Detection {
            Detection::not_found()
        }

        fn workspace_patterns(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn registry() -> DetectionRegistry {
        DetectionRegistry::new(CacheConfig::default())
    }

    #[test]
    fn register_plugin_adds_providers_and_hooks() {
        let mut registry = registry();
        let mut plugins = PluginSystem::new();

        let mut config = PluginConfig::new("extras");
        config.providers.push(Arc::new(StubProvider("bazel")));
        config
            .hooks
            .push((HookPoint::AfterDetection, Arc::new(|_| Ok(()))));

        plugins.register_plugin(&mut registry, config).unwrap();

        assert_eq!(registry.provider_names(), vec!["bazel"]);
        assert_eq!(plugins.hook_count(HookPoint::AfterDetection), 1);
        assert_eq!(plugins.plugin_names(), ["extras"]);
    }

    #[test]
    fn duplicate_plugin_name_is_rejected() {
        let mut registry = registry();
        let mut plugins = PluginSystem::new();

        plugins
            .register_plugin(&mut registry, PluginConfig::new("extras"))
            .unwrap();
        let result = plugins.register_plugin(&mut registry, PluginConfig::new("extras"));

        assert!(matches!(result, Err(Error::PluginConflict { .. })));
    }

    #[test]
    fn failed_provider_registration_rolls_back() {
        let mut registry = registry();
        registry
            .register_provider(Arc::new(StubProvider("taken")))
            .unwrap();

        let mut plugins = PluginSystem::new();
        let mut config = PluginConfig::new("extras");
        config.providers.push(Arc::new(StubProvider("fresh")));
        config.providers.push(Arc::new(StubProvider("taken")));

        let result = plugins.register_plugin(&mut registry, config);
        assert!(matches!(result, Err(Error::DuplicateProvider { .. })));

        // The plugin's successfully registered provider was removed again.
        assert_eq!(registry.provider_names(), vec!["taken"]);
        assert!(plugins.plugin_names().is_empty());
    }

    #[test]
    fn unregister_plugin_leaves_siblings_intact() {
        let mut registry = registry();
        let mut plugins = PluginSystem::new();

        let mut first = PluginConfig::new("first");
        first.providers.push(Arc::new(StubProvider("alpha")));
        first
            .hooks
            .push((HookPoint::BeforeDetection, Arc::new(|_| Ok(()))));
        plugins.register_plugin(&mut registry, first).unwrap();

        let mut second = PluginConfig::new("second");
        second.providers.push(Arc::new(StubProvider("beta")));
        second
            .hooks
            .push((HookPoint::BeforeDetection, Arc::new(|_| Ok(()))));
        plugins.register_plugin(&mut registry, second).unwrap();

        assert!(plugins.unregister_plugin(&mut registry, "first"));

        assert_eq!(registry.provider_names(), vec!["beta"]);
        assert_eq!(plugins.hook_count(HookPoint::BeforeDetection), 1);
        assert_eq!(plugins.plugin_names(), ["second"]);
        assert!(!plugins.unregister_plugin(&mut registry, "first"));
    }

    #[test]
    fn failing_hook_does_not_stop_siblings() {
        let mut plugins = PluginSystem::new();
        let calls = Arc::new(AtomicUsize::new(0));

        plugins.register_hook(
            HookPoint::AfterDetection,
            Arc::new(|_| Err("boom".into())),
            None,
        );
        let counter = Arc::clone(&calls);
        plugins.register_hook(
            HookPoint::AfterDetection,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            None,
        );

        let ran = plugins.call_hooks(HookPoint::AfterDetection, &HookContext::default());

        assert_eq!(ran, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hooks_receive_the_context() {
        let mut plugins = PluginSystem::new();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        plugins.register_hook(
            HookPoint::BeforeDetection,
            Arc::new(move |context| {
                *sink.lock().unwrap() = context.path.clone();
                Ok(())
            }),
            None,
        );

        plugins.call_hooks(
            HookPoint::BeforeDetection,
            &HookContext::for_detection(PathBuf::from("/repo/apps/web")),
        );

        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some(Path::new("/repo/apps/web"))
        );
    }

    #[test]
    fn empty_plugin_name_violates_contract() {
        let mut registry = registry();
        let mut plugins = PluginSystem::new();

        let result = plugins.register_plugin(&mut registry, PluginConfig::new("  "));
        assert!(matches!(result, Err(Error::ProviderContract { .. })));
    }

    #[test]
    fn calling_hooks_with_no_registrations_is_a_no_op() {
        let plugins = PluginSystem::new();
        assert_eq!(
            plugins.call_hooks(HookPoint::AfterWorkspaceSwitch, &HookContext::default()),
            0
        );
    }
}
