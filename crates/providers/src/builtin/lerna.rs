//! Lerna provider.

use crate::traits::MonorepoProvider;
use crate::util::read_json_lenient;
use monoenv_core::Detection;
use serde_json::{Value, json};
use std::path::Path;

/// Detects Lerna roots via `lerna.json`; 95 base, 99 with a `packages` field.
pub struct LernaProvider;

impl MonorepoProvider for LernaProvider {
    fn name(&self) -> &str {
        "lerna"
    }

    fn priority(&self) -> u32 {
        3
    }

    fn detect(&self, dir: &Path) -> Detection {
        let marker = dir.join("lerna.json");
        if !marker.is_file() {
            return Detection::not_found();
        }

        match read_json_lenient(&marker) {
            Some(config) => {
                let packages = config.get("packages").cloned();
                let confidence = if packages.is_some() { 99 } else { 95 };
                Detection::found_with_metadata(
                    confidence,
                    json!({
                        "marker": "lerna.json",
                        "packages": packages,
                    }),
                )
            }
            None => Detection::found(95),
        }
    }

    fn workspace_patterns(&self) -> Vec<String> {
        vec!["packages/*".to_string()]
    }

    fn dynamic_workspace_patterns(&self, metadata: Option<&Value>) -> Vec<String> {
        let configured: Vec<String> = metadata
            .and_then(|m| m.get("packages"))
            .and_then(Value::as_array)
            .map(|packages| {
                packages
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if configured.is_empty() {
            self.workspace_patterns()
        } else {
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn packages_field_bumps_confidence() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("lerna.json"),
            r#"{"packages": ["modules/*"]}"#,
        )
        .unwrap();

        let detection = LernaProvider.detect(dir.path());
        assert_eq!(detection.confidence, 99);

        let patterns = LernaProvider.dynamic_workspace_patterns(detection.metadata.as_ref());
        assert_eq!(patterns, vec!["modules/*"]);
    }

    #[test]
    fn bare_marker_scores_95_with_default_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("lerna.json"), r#"{"version": "5.0.0"}"#).unwrap();

        let detection = LernaProvider.detect(dir.path());
        assert_eq!(detection.confidence, 95);
        assert_eq!(
            LernaProvider.dynamic_workspace_patterns(detection.metadata.as_ref()),
            vec!["packages/*"]
        );
    }

    #[test]
    fn no_marker_is_not_detected() {
        let dir = TempDir::new().unwrap();
        assert!(!LernaProvider.detect(dir.path()).is_match());
    }
}
