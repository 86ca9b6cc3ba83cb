//! Declarative provider construction.
//!
//! Third parties describe a provider as data (a [`ProviderSpec`]) instead of
//! code; the factory turns that into a [`ConfiguredProvider`], one generic
//! implementation parameterized by a [`DetectionRule`] rather than a
//! synthesized type per provider.

use crate::traits::MonorepoProvider;
use crate::util::read_json_lenient;
use monoenv_core::{Detection, EnvResolution, Error, ProviderSpec, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Confidence granted for any marker match.
const BASE_CONFIDENCE: u32 = 50;
/// Budget distributed evenly across the spec's markers.
const MARKER_BUDGET: u32 = 40;
/// Budget distributed evenly across successfully parsed config fields.
const PARSE_BUDGET: u32 = 9;

/// Detection callback supplied to [`ConfiguredProvider::with_detect_fn`].
pub type DetectFn = Arc<dyn Fn(&Path) -> Detection + Send + Sync>;

/// How a [`ConfiguredProvider`] decides whether a directory is a root.
#[derive(Clone)]
pub enum DetectionRule {
    /// Marker presence only: 50 base plus an even share of a 40-point budget
    /// per found marker.
    Markers,
    /// Marker presence plus a named JSON field parsed from each mapped
    /// marker, adding points and metadata per successfully parsed file.
    JsonFields(BTreeMap<String, String>),
    /// Detection fully delegated to a supplied function.
    Custom(DetectFn),
}

impl fmt::Debug for DetectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markers => f.write_str("Markers"),
            Self::JsonFields(fields) => f.debug_tuple("JsonFields").field(fields).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A provider built from declarative configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredProvider {
    spec: ProviderSpec,
    rule: DetectionRule,
}

impl ConfiguredProvider {
    /// Builds a marker- or JSON-field-based provider from a spec.
    ///
    /// The rule is [`DetectionRule::JsonFields`] when the spec maps any
    /// config fields, [`DetectionRule::Markers`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the spec fails validation
    /// (empty name, no markers, config fields for unknown markers).
    pub fn from_spec(spec: ProviderSpec) -> Result<Self> {
        let issues = spec.issues();
        if !issues.is_empty() {
            return Err(Error::InvalidConfig { issues });
        }

        let rule = if spec.config_fields.is_empty() {
            DetectionRule::Markers
        } else {
            DetectionRule::JsonFields(spec.config_fields.clone())
        };
        Ok(Self { spec, rule })
    }

    /// Builds a provider whose detection is fully delegated to `detect`.
    ///
    /// The spec's markers are not consulted for detection and may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderContract`] when the spec has no name.
    pub fn with_detect_fn<F>(spec: ProviderSpec, detect: F) -> Result<Self>
    where
        F: Fn(&Path) -> Detection + Send + Sync + 'static,
    {
        if spec.name.trim().is_empty() {
            return Err(Error::ProviderContract {
                name: spec.name.clone(),
                message: "name must not be empty".to_string(),
            });
        }
        Ok(Self {
            spec,
            rule: DetectionRule::Custom(Arc::new(detect)),
        })
    }

    fn detect_markers(
        &self,
        dir: &Path,
        config_fields: Option<&BTreeMap<String, String>>,
    ) -> Detection {
        let total = self.spec.markers.len() as u32;
        let found: Vec<&String> = self
            .spec
            .markers
            .iter()
            .filter(|marker| dir.join(marker.as_str()).is_file())
            .collect();
        if found.is_empty() {
            return Detection::not_found();
        }

        let mut confidence = BASE_CONFIDENCE + (MARKER_BUDGET / total) * found.len() as u32;
        let mut metadata = Map::new();
        metadata.insert(
            "markers".to_string(),
            Value::Array(found.iter().map(|m| Value::from(m.as_str())).collect()),
        );

        if let Some(fields) = config_fields {
            let share = PARSE_BUDGET / fields.len() as u32;
            let mut parsed = Map::new();
            for (marker, field) in fields {
                if !found.iter().any(|m| *m == marker) {
                    continue;
                }
                if let Some(config) = read_json_lenient(&dir.join(marker))
                    && let Some(value) = config.get(field)
                {
                    confidence += share.max(1);
                    parsed.insert(marker.clone(), value.clone());
                }
            }
            if !parsed.is_empty() {
                metadata.insert("config".to_string(), Value::Object(parsed));
            }
        }

        let confidence = u8::try_from(confidence.min(99)).unwrap_or(99);
        Detection::found_with_metadata(confidence, Value::Object(metadata))
    }
}

impl MonorepoProvider for ConfiguredProvider {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn priority(&self) -> u32 {
        self.spec.priority
    }

    fn detect(&self, dir: &Path) -> Detection {
        match &self.rule {
            DetectionRule::Markers => self.detect_markers(dir, None),
            DetectionRule::JsonFields(fields) => self.detect_markers(dir, Some(fields)),
            DetectionRule::Custom(detect) => detect(dir),
        }
    }

    fn workspace_patterns(&self) -> Vec<String> {
        self.spec.workspace_patterns.clone()
    }

    fn env_resolution(&self) -> EnvResolution {
        self.spec.env_resolution.clone()
    }

    fn package_managers(&self) -> Vec<String> {
        self.spec.package_managers.clone()
    }

    fn cache_ttl(&self) -> Duration {
        self.spec
            .cache_ttl_ms
            .map_or(crate::traits::defaults::CACHE_TTL, Duration::from_millis)
    }

    fn max_depth(&self) -> usize {
        self.spec
            .max_depth
            .unwrap_or(crate::traits::defaults::MAX_DEPTH)
    }

    fn workspace_type_priority(&self) -> Vec<String> {
        if self.spec.workspace_type_priority.is_empty() {
            crate::traits::defaults::workspace_type_priority()
        } else {
            self.spec.workspace_type_priority.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn spec_with_markers(markers: &[&str]) -> ProviderSpec {
        let mut spec = ProviderSpec::new("custom");
        spec.markers = markers.iter().map(ToString::to_string).collect();
        spec
    }

    #[test]
    fn invalid_spec_is_rejected() {
        let result = ConfiguredProvider::from_spec(ProviderSpec::new("custom"));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn marker_budget_is_distributed_evenly() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("WORKSPACE.bazel"), "").unwrap();

        let provider =
            ConfiguredProvider::from_spec(spec_with_markers(&["WORKSPACE.bazel", "BUILD.bazel"]))
                .unwrap();

        // One of two markers found: 50 + 40/2.
        assert_eq!(provider.detect(dir.path()).confidence, 70);

        fs::write(dir.path().join("BUILD.bazel"), "").unwrap();
        assert_eq!(provider.detect(dir.path()).confidence, 90);
    }

    #[test]
    fn single_marker_scores_90() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rush.json"), "{}").unwrap();

        let provider = ConfiguredProvider::from_spec(spec_with_markers(&["rush.json"])).unwrap();
        assert_eq!(provider.detect(dir.path()).confidence, 90);
    }

    #[test]
    fn no_marker_found_is_not_detected() {
        let dir = TempDir::new().unwrap();
        let provider = ConfiguredProvider::from_spec(spec_with_markers(&["rush.json"])).unwrap();
        assert!(!provider.detect(dir.path()).is_match());
    }

    #[test]
    fn json_field_parse_adds_points_and_metadata() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("rush.json"),
            r#"{"projects": [{"packageName": "web"}]}"#,
        )
        .unwrap();

        let mut spec = spec_with_markers(&["rush.json"]);
        spec.config_fields
            .insert("rush.json".to_string(), "projects".to_string());
        let provider = ConfiguredProvider::from_spec(spec).unwrap();

        let detection = provider.detect(dir.path());
        // 50 + 40 + 9.
        assert_eq!(detection.confidence, 99);
        let metadata = detection.metadata.unwrap();
        assert!(metadata["config"]["rush.json"].is_array());
    }

    #[test]
    fn malformed_json_field_file_keeps_marker_points() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rush.json"), "{ broken").unwrap();

        let mut spec = spec_with_markers(&["rush.json"]);
        spec.config_fields
            .insert("rush.json".to_string(), "projects".to_string());
        let provider = ConfiguredProvider::from_spec(spec).unwrap();

        let detection = provider.detect(dir.path());
        assert!(detection.is_match());
        assert_eq!(detection.confidence, 90);
    }

    #[test]
    fn custom_detect_fn_is_delegated_to() {
        let provider = ConfiguredProvider::with_detect_fn(ProviderSpec::new("scripted"), |dir| {
            if dir.ends_with("magic") {
                Detection::found(42)
            } else {
                Detection::not_found()
            }
        })
        .unwrap();

        assert_eq!(provider.detect(Path::new("/repo/magic")).confidence, 42);
        assert!(!provider.detect(Path::new("/repo/other")).is_match());
    }

    #[test]
    fn custom_detect_fn_requires_name() {
        let result = ConfiguredProvider::with_detect_fn(ProviderSpec::new(""), |_| {
            Detection::not_found()
        });
        assert!(matches!(result, Err(Error::ProviderContract { .. })));
    }

    #[test]
    fn spec_overrides_flow_through_trait_methods() {
        let mut spec = spec_with_markers(&["rush.json"]);
        spec.cache_ttl_ms = Some(10_000);
        spec.max_depth = Some(2);
        spec.workspace_patterns = vec!["projects/*".to_string()];
        let provider = ConfiguredProvider::from_spec(spec).unwrap();

        assert_eq!(provider.cache_ttl(), Duration::from_millis(10_000));
        assert_eq!(provider.max_depth(), 2);
        assert_eq!(provider.workspace_patterns(), vec!["projects/*"]);
    }
}
