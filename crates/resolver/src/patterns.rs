//! Workspace glob-pattern expansion.

use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names pruned from every walk; they never contain workspaces and
/// dominate traversal cost when descended into.
const PRUNED_DIRS: [&str; 4] = ["node_modules", ".git", "target", "dist"];

/// Expands glob patterns into concrete directories under `root`.
///
/// Patterns starting with `!` are treated as exclusions. The walk descends at
/// most `max_depth` levels below the root and prunes common heavy
/// directories. Invalid patterns are skipped with a warning rather than
/// failing the expansion, and a pattern matching zero directories simply
/// contributes nothing.
///
/// Returns a sorted list of unique absolute paths.
pub fn expand_workspace_patterns(
    root: &Path,
    patterns: &[String],
    max_depth: usize,
) -> Vec<PathBuf> {
    let mut inclusions = Vec::new();
    let mut exclusions = Vec::new();

    for raw in patterns {
        let (source, excluded) = match raw.strip_prefix('!') {
            Some(stripped) => (stripped, true),
            None => (raw.as_str(), false),
        };
        match Pattern::new(source) {
            Ok(pattern) if excluded => exclusions.push(pattern),
            Ok(pattern) => inclusions.push(pattern),
            Err(error) => {
                tracing::warn!(pattern = source, %error, "invalid workspace pattern; skipping");
            }
        }
    }

    if inclusions.is_empty() {
        return Vec::new();
    }

    let mut matched = HashSet::new();
    let walker = WalkDir::new(root).max_depth(max_depth).follow_links(false);

    for entry in walker
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            !PRUNED_DIRS.contains(&name)
        })
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if path == root {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        if exclusions.iter().any(|p| p.matches_path(relative)) {
            continue;
        }
        if inclusions.iter().any(|p| p.matches_path(relative)) {
            matched.insert(path.to_path_buf());
        }
    }

    let mut result: Vec<PathBuf> = matched.into_iter().collect();
    result.sort();
    result
}
