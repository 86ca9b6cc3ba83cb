//! Turborepo provider.

use crate::traits::MonorepoProvider;
use crate::util::read_json_lenient;
use monoenv_core::Detection;
use serde_json::json;
use std::path::Path;

/// Detects Turborepo roots via `turbo.json`.
///
/// Confidence is 95 for a bare marker, bumped to 99 when the parsed config
/// carries a `pipeline` (turbo < 2) or `tasks` (turbo >= 2) table.
pub struct TurborepoProvider;

impl MonorepoProvider for TurborepoProvider {
    fn name(&self) -> &str {
        "turborepo"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn detect(&self, dir: &Path) -> Detection {
        let marker = dir.join("turbo.json");
        if !marker.is_file() {
            return Detection::not_found();
        }

        match read_json_lenient(&marker) {
            Some(config) => {
                let has_pipeline =
                    config.get("pipeline").is_some() || config.get("tasks").is_some();
                let confidence = if has_pipeline { 99 } else { 95 };
                Detection::found_with_metadata(
                    confidence,
                    json!({
                        "marker": "turbo.json",
                        "has_pipeline": has_pipeline,
                    }),
                )
            }
            None => Detection::found(95),
        }
    }

    fn workspace_patterns(&self) -> Vec<String> {
        vec!["apps/*".to_string(), "packages/*".to_string()]
    }
}
