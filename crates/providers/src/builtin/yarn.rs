//! Yarn/npm workspaces provider.

use crate::traits::MonorepoProvider;
use crate::util::{read_json_lenient, read_yaml_lenient};
use monoenv_core::Detection;
use serde_json::{Map, Value};
use std::path::Path;

/// Detects Yarn/npm/pnpm-flavored workspace roots via the `workspaces` field
/// of `package.json`.
///
/// A `package.json` without a `workspaces` field is no match even though the
/// file exists; the marker is far too common to stand alone, which is also
/// why this provider ranks last among the builtins.
///
/// Confidence: 85 for the plain-array form, 90 for the object form with a
/// `packages` sub-field, plus a lockfile bonus (`yarn.lock` +9,
/// `package-lock.json` or `pnpm-workspace.yaml` +5), capped at 99.
pub struct YarnWorkspacesProvider;

impl MonorepoProvider for YarnWorkspacesProvider {
    fn name(&self) -> &str {
        "yarn_workspaces"
    }

    fn priority(&self) -> u32 {
        6
    }

    fn detect(&self, dir: &Path) -> Detection {
        let marker = dir.join("package.json");
        if !marker.is_file() {
            return Detection::not_found();
        }
        let Some(config) = read_json_lenient(&marker) else {
            // Without a parseable file we cannot see a workspaces field, and
            // the bare marker is meaningless here.
            return Detection::not_found();
        };
        let Some(workspaces) = config.get("workspaces") else {
            return Detection::not_found();
        };

        let (mut confidence, format, patterns) = match workspaces {
            Value::Array(entries) => (85_u8, "array", collect_patterns(entries)),
            Value::Object(fields) => {
                let entries = fields
                    .get("packages")
                    .and_then(Value::as_array)
                    .map(|e| collect_patterns(e))
                    .unwrap_or_default();
                (90_u8, "packages_object", entries)
            }
            _ => return Detection::not_found(),
        };

        let mut metadata = Map::new();
        metadata.insert("workspace_format".to_string(), Value::from(format));
        metadata.insert(
            "patterns".to_string(),
            Value::Array(patterns.iter().map(|p| Value::from(p.as_str())).collect()),
        );

        if dir.join("yarn.lock").is_file() {
            confidence = (confidence + 9).min(99);
            metadata.insert("lockfile".to_string(), Value::from("yarn.lock"));
        } else if dir.join("package-lock.json").is_file() {
            confidence = (confidence + 5).min(99);
            metadata.insert("lockfile".to_string(), Value::from("package-lock.json"));
        } else if dir.join("pnpm-workspace.yaml").is_file() {
            confidence = (confidence + 5).min(99);
            metadata.insert("lockfile".to_string(), Value::from("pnpm-workspace.yaml"));
            if let Some(pnpm) = read_yaml_lenient(&dir.join("pnpm-workspace.yaml")) {
                let pnpm_packages: Vec<Value> = pnpm
                    .get("packages")
                    .and_then(serde_yaml::Value::as_sequence)
                    .map(|seq| {
                        seq.iter()
                            .filter_map(serde_yaml::Value::as_str)
                            .map(Value::from)
                            .collect()
                    })
                    .unwrap_or_default();
                metadata.insert("pnpm_packages".to_string(), Value::Array(pnpm_packages));
            }
        }

        Detection::found_with_metadata(confidence, Value::Object(metadata))
    }

    fn workspace_patterns(&self) -> Vec<String> {
        vec!["packages/*".to_string()]
    }

    fn dynamic_workspace_patterns(&self, metadata: Option<&Value>) -> Vec<String> {
        let configured: Vec<String> = metadata
            .and_then(|m| m.get("patterns"))
            .and_then(Value::as_array)
            .map(|patterns| {
                patterns
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

fn collect_patterns(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(Value::as_str)
        .map(ToString::to_string)
        .collect()
}
