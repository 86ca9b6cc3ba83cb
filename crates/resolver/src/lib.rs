//! Monorepo root detection, workspace discovery, and env-file resolution.
//!
//! The resolution pipeline runs in three stages, each cached independently:
//!
//! 1. [`DetectionRegistry::detect_monorepo`] walks upward from a path asking
//!    priority-sorted providers whether they recognize a monorepo root.
//! 2. [`WorkspaceFinder::find_workspaces`] expands the matching provider's
//!    glob patterns into validated workspace directories.
//! 3. [`EnvironmentResolver::resolve_env_files`] applies the provider's
//!    resolution strategy to produce the ordered env-file list, batching all
//!    filesystem globs through the [`BulkResolver`].
//!
//! Every stage is a total function over its inputs at runtime: a path outside
//! any monorepo, a pattern matching nothing, or a missing directory all
//! produce empty results, never errors.

pub mod bulk;
pub mod detection;
pub mod env;
pub mod finder;
pub mod patterns;

pub use bulk::{BulkResolver, EXISTENCE_TTL};
pub use detection::{DetectionRegistry, DetectionStats, NEGATIVE_DETECTION_TTL};
pub use env::{
    DEFAULT_ENV_PATTERNS, EnvFileComparator, EnvironmentResolver, ResolveOptions,
};
pub use finder::WorkspaceFinder;
pub use patterns::expand_workspace_patterns;
