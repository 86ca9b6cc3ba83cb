//! Configuration schema for the monoenv engine.
//!
//! The configuration surface is a strongly-typed struct tree deserialized
//! with `deny_unknown_fields` (unknown fields are rejected at parse time) and
//! range-checked once by [`Settings::validate`] before the engine is
//! constructed. `Settings::default()` yields the complete default tree, so
//! deserializing `{}` produces a fully populated configuration.

use crate::error::{Error, Result};
use crate::types::EnvResolution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Names of the built-in providers, in detection priority order.
pub const BUILTIN_PROVIDER_NAMES: [&str; 5] = [
    "turborepo",
    "nx",
    "lerna",
    "cargo_workspaces",
    "yarn_workspaces",
];

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Master switch; a disabled engine answers every query with an empty result.
    pub enabled: bool,
    /// Whether the workspace manager switches workspaces as files are visited.
    pub auto_switch: bool,
    /// Whether workspace switches notify registered listeners.
    pub notify_on_switch: bool,
    /// Provider selection and custom provider declarations.
    pub providers: ProviderSettings,
    /// Cache and throttling tunables.
    pub performance: PerformanceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_switch: true,
            notify_on_switch: true,
            providers: ProviderSettings::default(),
            performance: PerformanceSettings::default(),
        }
    }
}

/// Provider selection: which builtins to load and which custom providers to add.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderSettings {
    /// Built-in provider names to register; defaults to all of them.
    pub builtin: Vec<String>,
    /// Declarative custom providers built through the provider factory.
    pub custom: Vec<ProviderSpec>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            builtin: BUILTIN_PROVIDER_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
            custom: Vec::new(),
        }
    }
}

/// Declarative description of a custom provider.
///
/// A spec with only `markers` produces a marker-presence provider; adding
/// `config_fields` upgrades detection to parse a named JSON field out of each
/// marker file for extra confidence and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProviderSpec {
    /// Unique provider name.
    pub name: String,
    /// Detection priority; lower is tried first.
    #[serde(default = "default_spec_priority")]
    pub priority: u32,
    /// Marker filenames whose presence identifies the monorepo root.
    #[serde(default)]
    pub markers: Vec<String>,
    /// Optional marker filename → JSON field to parse for confidence bonus
    /// and metadata.
    #[serde(default)]
    pub config_fields: BTreeMap<String, String>,
    /// Glob patterns locating workspace directories under the root.
    #[serde(default)]
    pub workspace_patterns: Vec<String>,
    /// Workspace-type names in sort priority order.
    #[serde(default)]
    pub workspace_type_priority: Vec<String>,
    /// Environment-file resolution policy.
    #[serde(default)]
    pub env_resolution: EnvResolution,
    /// Package-manager marker files validating a workspace directory.
    #[serde(default = "default_spec_package_managers")]
    pub package_managers: Vec<String>,
    /// Detection cache TTL in milliseconds; `None` uses the provider default.
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,
    /// Maximum workspace depth below the root; `None` uses the provider default.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_spec_priority() -> u32 {
    10
}

fn default_spec_package_managers() -> Vec<String> {
    vec!["package.json".to_string()]
}

impl ProviderSpec {
    /// Creates a spec with the given name and all defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: default_spec_priority(),
            markers: Vec::new(),
            config_fields: BTreeMap::new(),
            workspace_patterns: Vec::new(),
            workspace_type_priority: Vec::new(),
            env_resolution: EnvResolution::default(),
            package_managers: default_spec_package_managers(),
            cache_ttl_ms: None,
            max_depth: None,
        }
    }

    /// Collects validation issues for this spec; empty means valid.
    #[must_use]
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push("custom provider name must not be empty".to_string());
        }
        if self.markers.is_empty() {
            issues.push(format!(
                "custom provider '{}' declares no detection markers",
                self.name
            ));
        }
        for marker in self.config_fields.keys() {
            if !self.markers.iter().any(|m| m == marker) {
                issues.push(format!(
                    "custom provider '{}' maps config field for unknown marker '{marker}'",
                    self.name
                ));
            }
        }
        issues
    }
}

/// Cache and throttling tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct PerformanceSettings {
    /// Cache bounds shared by the detection, workspace, and env-file namespaces.
    pub cache: CacheSettings,
    /// Auto-switch throttling.
    pub auto_switch_throttle: ThrottleSettings,
}

/// Bounds for each cache namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CacheSettings {
    /// Maximum entries per namespace; range `[10, 10000]`.
    pub max_entries: usize,
    /// Default entry TTL in milliseconds; range `[1000, 3600000]`.
    pub default_ttl_ms: u64,
    /// Minimum interval between cleanup sweeps in milliseconds; range `[1000, 600000]`.
    pub cleanup_interval_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: 300_000,
            cleanup_interval_ms: 60_000,
        }
    }
}

/// Auto-switch throttling tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ThrottleSettings {
    /// Minimum interval between workspace switches in milliseconds; at most 60000.
    pub min_interval_ms: u64,
    /// Deferred switch requests coalesced before a switch is forced; range `[1, 100]`.
    pub max_pending: usize,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 500,
            max_pending: 8,
        }
    }
}

impl Settings {
    /// Deserializes settings from a JSON value, then validates them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for schema violations (including unknown
    /// fields) and [`Error::InvalidConfig`] for out-of-range values.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let settings: Self = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and validates settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, [`Error::Json`]
    /// when it cannot be parsed, and [`Error::InvalidConfig`] when values are
    /// out of range.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Io {
            source: e,
            path: Some(path.to_path_buf()),
            operation: "reading configuration".to_string(),
        })?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| Error::Json {
            source: e,
            path: Some(path.to_path_buf()),
        })?;
        Self::from_json(value)
    }

    /// Range-checks every numeric field and verifies provider references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] carrying every violation found.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        let cache = &self.performance.cache;
        if !(10..=10_000).contains(&cache.max_entries) {
            issues.push(format!(
                "performance.cache.max_entries must be in [10, 10000], got {}",
                cache.max_entries
            ));
        }
        if !(1_000..=3_600_000).contains(&cache.default_ttl_ms) {
            issues.push(format!(
                "performance.cache.default_ttl_ms must be in [1000, 3600000], got {}",
                cache.default_ttl_ms
            ));
        }
        if !(1_000..=600_000).contains(&cache.cleanup_interval_ms) {
            issues.push(format!(
                "performance.cache.cleanup_interval_ms must be in [1000, 600000], got {}",
                cache.cleanup_interval_ms
            ));
        }

        let throttle = &self.performance.auto_switch_throttle;
        if throttle.min_interval_ms > 60_000 {
            issues.push(format!(
                "performance.auto_switch_throttle.min_interval_ms must be at most 60000, got {}",
                throttle.min_interval_ms
            ));
        }
        if !(1..=100).contains(&throttle.max_pending) {
            issues.push(format!(
                "performance.auto_switch_throttle.max_pending must be in [1, 100], got {}",
                throttle.max_pending
            ));
        }

        for name in &self.providers.builtin {
            if !BUILTIN_PROVIDER_NAMES.contains(&name.as_str()) {
                issues.push(format!(
                    "providers.builtin contains unknown provider '{name}'"
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.providers.custom {
            issues.extend(spec.issues());
            if !spec.name.trim().is_empty() && !seen.insert(spec.name.as_str()) {
                issues.push(format!(
                    "providers.custom declares provider '{}' more than once",
                    spec.name
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig { issues })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_yields_full_default_tree() {
        let settings = Settings::from_json(json!({})).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(settings.enabled);
        assert_eq!(settings.providers.builtin.len(), 5);
        assert_eq!(settings.performance.cache.max_entries, 1000);
        assert_eq!(settings.performance.cache.default_ttl_ms, 300_000);
        assert_eq!(settings.performance.cache.cleanup_interval_ms, 60_000);
        assert_eq!(settings.performance.auto_switch_throttle.max_pending, 8);
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let result = Settings::from_json(json!({ "colour_scheme": "mono" }));
        assert!(matches!(result, Err(Error::Json { .. })));
    }

    #[test]
    fn unknown_nested_field_is_rejected() {
        let result = Settings::from_json(json!({ "performance": { "cache": { "size": 5 } } }));
        assert!(matches!(result, Err(Error::Json { .. })));
    }

    #[test]
    fn out_of_range_max_entries_is_rejected() {
        let result = Settings::from_json(json!({
            "performance": { "cache": { "max_entries": 5 } }
        }));

        match result {
            Err(Error::InvalidConfig { issues }) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].contains("max_entries"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn validation_collects_multiple_issues() {
        let result = Settings::from_json(json!({
            "providers": { "builtin": ["turborepo", "maven"] },
            "performance": {
                "cache": { "max_entries": 50000, "default_ttl_ms": 10 }
            }
        }));

        match result {
            Err(Error::InvalidConfig { issues }) => {
                assert_eq!(issues.len(), 3);
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn custom_spec_without_markers_is_rejected() {
        let result = Settings::from_json(json!({
            "providers": { "custom": [{ "name": "bazel" }] }
        }));

        match result {
            Err(Error::InvalidConfig { issues }) => {
                assert!(issues[0].contains("no detection markers"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn custom_spec_round_trips() {
        let settings = Settings::from_json(json!({
            "providers": {
                "custom": [{
                    "name": "bazel",
                    "priority": 4,
                    "markers": ["WORKSPACE.bazel"],
                    "workspace_patterns": ["services/*"],
                    "env_resolution": { "strategy": "root_first" }
                }]
            }
        }))
        .unwrap();

        let spec = &settings.providers.custom[0];
        assert_eq!(spec.name, "bazel");
        assert_eq!(spec.priority, 4);
        assert_eq!(
            spec.env_resolution.strategy,
            crate::types::ResolutionStrategy::RootFirst
        );
        assert_eq!(spec.package_managers, vec!["package.json".to_string()]);
    }

    #[test]
    fn from_path_reads_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("monoenv.json");
        std::fs::write(&path, r#"{ "auto_switch": false }"#).unwrap();

        let settings = Settings::from_path(&path).unwrap();
        assert!(!settings.auto_switch);
        assert!(settings.enabled);
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let result = Settings::from_path(Path::new("/nonexistent/monoenv.json"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
