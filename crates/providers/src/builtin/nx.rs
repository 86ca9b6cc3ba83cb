//! Nx provider.

use crate::traits::MonorepoProvider;
use crate::util::read_json_lenient;
use monoenv_core::Detection;
use serde_json::{Map, Value};
use std::path::Path;

/// Detects Nx roots via `nx.json` or `workspace.json` (either suffices).
///
/// Base confidence is 80, incremented per structural signal found (a task
/// runner configuration, implicit dependencies, a non-empty project map) and
/// capped at 99. A configured `workspaceLayout` refines the workspace glob
/// patterns through [`MonorepoProvider::dynamic_workspace_patterns`].
pub struct NxProvider;

const SIGNAL_BONUS: u8 = 6;

impl MonorepoProvider for NxProvider {
    fn name(&self) -> &str {
        "nx"
    }

    fn priority(&self) -> u32 {
        2
    }

    fn detect(&self, dir: &Path) -> Detection {
        let nx_json = dir.join("nx.json");
        let workspace_json = dir.join("workspace.json");
        let has_nx_json = nx_json.is_file();
        let has_workspace_json = workspace_json.is_file();
        if !has_nx_json && !has_workspace_json {
            return Detection::not_found();
        }

        let mut confidence: u8 = 80;
        let mut metadata = Map::new();
        let mut markers = Vec::new();
        if has_nx_json {
            markers.push(Value::from("nx.json"));
        }
        if has_workspace_json {
            markers.push(Value::from("workspace.json"));
        }
        metadata.insert("markers".to_string(), Value::Array(markers));

        if has_nx_json
            && let Some(config) = read_json_lenient(&nx_json)
        {
            if config.get("tasksRunnerOptions").is_some() {
                confidence = (confidence + SIGNAL_BONUS).min(99);
                metadata.insert("has_task_runner".to_string(), Value::Bool(true));
            }
            if config.get("implicitDependencies").is_some() {
                confidence = (confidence + SIGNAL_BONUS).min(99);
                metadata.insert("has_implicit_dependencies".to_string(), Value::Bool(true));
            }
            if let Some(layout) = config.get("workspaceLayout") {
                metadata.insert("workspace_layout".to_string(), layout.clone());
            }
        }

        if has_workspace_json
            && let Some(config) = read_json_lenient(&workspace_json)
        {
            let project_count = config
                .get("projects")
                .and_then(Value::as_object)
                .map_or(0, Map::len);
            if project_count > 0 {
                confidence = (confidence + SIGNAL_BONUS).min(99);
                metadata.insert("project_count".to_string(), Value::from(project_count));
            }
        }

        Detection::found_with_metadata(confidence, Value::Object(metadata))
    }

    fn workspace_patterns(&self) -> Vec<String> {
        vec![
            "apps/*".to_string(),
            "packages/*".to_string(),
            "libs/*".to_string(),
        ]
    }

    fn dynamic_workspace_patterns(&self, metadata: Option<&Value>) -> Vec<String> {
        let layout = metadata.and_then(|m| m.get("workspace_layout"));
        let Some(layout) = layout else {
            return self.workspace_patterns();
        };

        let apps_dir = layout
            .get("appsDir")
            .and_then(Value::as_str)
            .unwrap_or("apps");
        let libs_dir = layout
            .get("libsDir")
            .and_then(Value::as_str)
            .unwrap_or("libs");

        let mut patterns = vec![
            format!("{apps_dir}/*"),
            "packages/*".to_string(),
            format!("{libs_dir}/*"),
        ];
        patterns.dedup();
        patterns
    }
}
