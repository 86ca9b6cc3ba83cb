//! Cargo workspaces provider.

use crate::traits::MonorepoProvider;
use monoenv_core::Detection;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::Path;

/// Detects Cargo workspace roots via a `Cargo.toml` with a `[workspace]`
/// section.
///
/// Confidence is 90, +5 when `members` is present, capped at 99. The manifest
/// is parsed with a full TOML parser, so nested tables such as
/// `[workspace.dependencies]` and inline-table syntax are handled; a manifest
/// that fails to parse still counts as a marker when a `[workspace]` section
/// header is visible at line level.
pub struct CargoWorkspacesProvider;

#[derive(Deserialize)]
struct CargoManifest {
    workspace: Option<WorkspaceSection>,
}

#[derive(Deserialize)]
struct WorkspaceSection {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

impl MonorepoProvider for CargoWorkspacesProvider {
    fn name(&self) -> &str {
        "cargo_workspaces"
    }

    fn priority(&self) -> u32 {
        5
    }

    fn detect(&self, dir: &Path) -> Detection {
        let marker = dir.join("Cargo.toml");
        if !marker.is_file() {
            return Detection::not_found();
        }
        let Ok(content) = fs::read_to_string(&marker) else {
            return Detection::not_found();
        };

        match toml::from_str::<CargoManifest>(&content) {
            Ok(manifest) => match manifest.workspace {
                None => Detection::not_found(),
                Some(workspace) => {
                    let confidence: u8 = if workspace.members.is_empty() { 90 } else { 95 };
                    Detection::found_with_metadata(
                        confidence.min(99),
                        json!({
                            "marker": "Cargo.toml",
                            "members": workspace.members,
                            "exclude": workspace.exclude,
                        }),
                    )
                }
            },
            Err(error) => {
                if has_workspace_header(&content) {
                    tracing::debug!(
                        path = %marker.display(),
                        %error,
                        "Cargo.toml is not valid TOML; counting [workspace] header without parse bonus"
                    );
                    Detection::found(90)
                } else {
                    Detection::not_found()
                }
            }
        }
    }

    fn workspace_patterns(&self) -> Vec<String> {
        vec!["crates/*".to_string()]
    }

    fn dynamic_workspace_patterns(&self, metadata: Option<&serde_json::Value>) -> Vec<String> {
        let Some(metadata) = metadata else {
            return self.workspace_patterns();
        };

        let members: Vec<String> = metadata
            .get("members")
            .and_then(serde_json::Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if members.is_empty() {
            return self.workspace_patterns();
        }

        // Exclusions join the pattern list with glob negation.
        let excludes = metadata
            .get("exclude")
            .and_then(serde_json::Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(|e| format!("!{e}"))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        members.into_iter().chain(excludes).collect()
    }

    fn package_managers(&self) -> Vec<String> {
        vec!["Cargo.toml".to_string()]
    }

    fn workspace_type_priority(&self) -> Vec<String> {
        ["crates", "apps", "libs", "tools"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Line-level sniff for a `[workspace]` section header.
fn has_workspace_header(content: &str) -> bool {
    content.lines().any(|line| {
        let trimmed = line.trim();
        trimmed == "[workspace]" || trimmed.starts_with("[workspace.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn manifest_without_workspace_section_is_no_match() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"solo\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        assert!(!CargoWorkspacesProvider.detect(dir.path()).is_match());
    }

    #[test]
    fn workspace_with_members_scores_95() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"crates/*\"]\nexclude = [\"crates/legacy\"]\n",
        )
        .unwrap();

        let detection = CargoWorkspacesProvider.detect(dir.path());
        assert_eq!(detection.confidence, 95);

        let patterns =
            CargoWorkspacesProvider.dynamic_workspace_patterns(detection.metadata.as_ref());
        assert_eq!(patterns, vec!["crates/*", "!crates/legacy"]);
    }

    #[test]
    fn empty_workspace_section_scores_90() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").unwrap();

        let detection = CargoWorkspacesProvider.detect(dir.path());
        assert_eq!(detection.confidence, 90);
        assert_eq!(
            CargoWorkspacesProvider.dynamic_workspace_patterns(detection.metadata.as_ref()),
            vec!["crates/*"]
        );
    }

    #[test]
    fn nested_workspace_tables_parse() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"crates/a\"]\n\n[workspace.dependencies]\nserde = { version = \"1\", features = [\"derive\"] }\n",
        )
        .unwrap();

        let detection = CargoWorkspacesProvider.detect(dir.path());
        assert_eq!(detection.confidence, 95);
    }

    #[test]
    fn invalid_toml_with_workspace_header_counts_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"unclosed\n",
        )
        .unwrap();

        let detection = CargoWorkspacesProvider.detect(dir.path());
        assert!(detection.is_match());
        assert_eq!(detection.confidence, 90);
        assert!(detection.metadata.is_none());
    }

    #[test]
    fn cargo_toml_validates_workspaces_instead_of_package_json() {
        assert_eq!(
            CargoWorkspacesProvider.package_managers(),
            vec!["Cargo.toml"]
        );
    }
}
