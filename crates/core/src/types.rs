//! Core data types for monorepo detection and workspace resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// How environment files from the workspace and the monorepo root are
/// combined when resolving the files that apply to a location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Only the workspace directory is searched; no workspace means no files.
    WorkspaceOnly,
    /// Workspace files first; root files follow when inheritance is enabled.
    #[default]
    WorkspaceFirst,
    /// Root files first, then workspace files.
    RootFirst,
    /// Root and workspace files concatenated in the order given by
    /// [`EnvResolution::override_order`].
    Merge,
}

impl ResolutionStrategy {
    /// String representation used in cache keys and diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WorkspaceOnly => "workspace_only",
            Self::WorkspaceFirst => "workspace_first",
            Self::RootFirst => "root_first",
            Self::Merge => "merge",
        }
    }
}

/// A search scope participating in [`ResolutionStrategy::Merge`] ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvScope {
    /// The monorepo root directory.
    Root,
    /// The active workspace directory.
    Workspace,
}

/// A provider's environment-file resolution policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct EnvResolution {
    /// Strategy used to combine workspace and root files.
    pub strategy: ResolutionStrategy,
    /// Whether the root directory is inherited under `workspace_first`.
    pub inheritance: bool,
    /// Concatenation order for the `merge` strategy. Earlier entries win
    /// under first-match-wins consumption.
    pub override_order: Vec<EnvScope>,
}

impl Default for EnvResolution {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::WorkspaceFirst,
            inheritance: true,
            override_order: vec![EnvScope::Workspace, EnvScope::Root],
        }
    }
}

/// Result of asking a provider whether a directory is a monorepo root.
///
/// Invariant: `confidence == 0` if and only if `found` is `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// Whether the provider recognized the directory.
    pub found: bool,
    /// Confidence score in `[0, 100]`; zero means not detected.
    pub confidence: u8,
    /// Provider-specific metadata extracted from parsed marker files.
    pub metadata: Option<serde_json::Value>,
}

impl Detection {
    /// A negative detection result.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            found: false,
            confidence: 0,
            metadata: None,
        }
    }

    /// A positive detection with the given confidence, clamped to `[1, 100]`.
    #[must_use]
    pub fn found(confidence: u8) -> Self {
        Self {
            found: true,
            confidence: confidence.clamp(1, 100),
            metadata: None,
        }
    }

    /// A positive detection carrying metadata from a parsed marker file.
    #[must_use]
    pub fn found_with_metadata(confidence: u8, metadata: serde_json::Value) -> Self {
        Self {
            found: true,
            confidence: confidence.clamp(1, 100),
            metadata: Some(metadata),
        }
    }

    /// Whether this result counts as a match during root detection.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.confidence > 0
    }
}

/// Detection details recorded alongside a matched root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionInfo {
    /// Confidence reported by the matching provider.
    pub confidence: u8,
    /// Metadata from the matching provider, if any.
    pub metadata: Option<serde_json::Value>,
    /// When the detection walk produced this result.
    pub detected_at: SystemTime,
}

/// A successfully detected monorepo root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionOutcome {
    /// Absolute path of the monorepo root.
    pub root: PathBuf,
    /// Name of the provider that recognized the root.
    pub provider_name: String,
    /// Confidence, metadata, and timestamp for the match.
    pub info: DetectionInfo,
}

/// A discovered workspace directory inside a monorepo.
///
/// Workspaces are created fresh on every finder call (or served from cache)
/// and never mutated afterwards. Identity is the absolute `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    /// Absolute directory path; unique identity key.
    pub path: PathBuf,
    /// Directory basename.
    pub name: String,
    /// Path relative to the monorepo root.
    pub relative_path: PathBuf,
    /// First path segment under the root (e.g. `apps`, `packages`), used for
    /// priority sorting.
    pub ws_type: String,
    /// Name of the provider that discovered this workspace.
    pub provider_name: String,
    /// Number of path segments between the root and this directory.
    pub depth: usize,
    /// Whether the directory contains one of the provider's package-manager
    /// marker files. Workspaces lacking a marker are excluded from results.
    pub has_package_manager: bool,
}

impl Workspace {
    /// Builds a workspace record for a directory under `root`.
    ///
    /// Returns `None` when `path` is not strictly inside `root` (the root
    /// itself is not a workspace).
    #[must_use]
    pub fn from_root(root: &Path, path: PathBuf, provider_name: &str) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let ws_type = segments.first()?.clone();
        let name = segments.last()?.clone();

        Some(Self {
            path: path.clone(),
            name,
            relative_path: relative.to_path_buf(),
            ws_type,
            provider_name: provider_name.to_string(),
            depth: segments.len(),
            has_package_manager: false,
        })
    }

    /// Whether `file` lives inside this workspace.
    #[must_use]
    pub fn contains(&self, file: &Path) -> bool {
        file.starts_with(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_not_found_has_zero_confidence() {
        let detection = Detection::not_found();
        assert!(!detection.is_match());
        assert_eq!(detection.confidence, 0);
    }

    #[test]
    fn detection_found_clamps_confidence() {
        assert_eq!(Detection::found(150).confidence, 100);
        assert_eq!(Detection::found(0).confidence, 1);
        assert_eq!(Detection::found(95).confidence, 95);
    }

    #[test]
    fn env_resolution_default_is_workspace_first_with_inheritance() {
        let resolution = EnvResolution::default();
        assert_eq!(resolution.strategy, ResolutionStrategy::WorkspaceFirst);
        assert!(resolution.inheritance);
        assert_eq!(
            resolution.override_order,
            vec![EnvScope::Workspace, EnvScope::Root]
        );
    }

    #[test]
    fn strategy_round_trips_through_serde() {
        let json = serde_json::to_string(&ResolutionStrategy::RootFirst).unwrap();
        assert_eq!(json, "\"root_first\"");
        let parsed: ResolutionStrategy = serde_json::from_str("\"merge\"").unwrap();
        assert_eq!(parsed, ResolutionStrategy::Merge);
    }

    #[test]
    fn workspace_from_root_fills_derived_fields() {
        let root = Path::new("/repo");
        let ws = Workspace::from_root(root, PathBuf::from("/repo/apps/web"), "turborepo").unwrap();

        assert_eq!(ws.name, "web");
        assert_eq!(ws.ws_type, "apps");
        assert_eq!(ws.relative_path, PathBuf::from("apps/web"));
        assert_eq!(ws.depth, 2);
        assert!(!ws.has_package_manager);
    }

    #[test]
    fn workspace_from_root_rejects_root_itself() {
        let root = Path::new("/repo");
        assert!(Workspace::from_root(root, PathBuf::from("/repo"), "nx").is_none());
        assert!(Workspace::from_root(root, PathBuf::from("/elsewhere/x"), "nx").is_none());
    }

    #[test]
    fn workspace_contains_checks_prefix() {
        let root = Path::new("/repo");
        let ws = Workspace::from_root(root, PathBuf::from("/repo/apps/web"), "turborepo").unwrap();

        assert!(ws.contains(Path::new("/repo/apps/web/src/index.ts")));
        assert!(!ws.contains(Path::new("/repo/apps/docs/src/index.ts")));
    }
}
