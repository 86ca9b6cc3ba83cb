//! Monorepo detection and environment-file resolution engine.
//!
//! monoenv discovers environment-variable files across a monorepo and merges
//! them according to provider-defined precedence rules. The pipeline:
//!
//! 1. **Detection**: walk upward from a path, asking priority-sorted
//!    providers (Turborepo, Nx, Lerna, Cargo workspaces, Yarn/npm workspaces,
//!    plus configured custom ones) whether they recognize a monorepo root.
//! 2. **Workspace discovery**: expand the matching provider's glob patterns
//!    into validated workspace directories.
//! 3. **Env-file resolution**: apply the provider's strategy
//!    (workspace-only, workspace-first, root-first, merge) to produce the
//!    ordered file list consumers load with first-match-wins semantics.
//!
//! Every stage caches its results with TTL- and size-bounded eviction, and
//! every runtime lookup is total: a path outside any monorepo is an empty
//! result, never an error.
//!
//! # Example
//!
//! ```no_run
//! use monoenv::{Engine, ResolveOptions, Settings};
//! use std::path::Path;
//!
//! # fn main() -> monoenv::Result<()> {
//! let mut engine = Engine::new(Settings::default())?;
//!
//! let file = Path::new("/repo/apps/web/src/index.ts");
//! if let Some(outcome) = engine.detect_monorepo_root(file) {
//!     let workspaces = engine.workspaces_for(&outcome);
//!     let workspace = Engine::find_current_workspace(file, &workspaces);
//!     let files = engine.resolve_env_files(
//!         workspace.as_ref(),
//!         &outcome.root,
//!         &outcome.provider_name,
//!         None,
//!         &ResolveOptions::default(),
//!     );
//!     println!("env files, highest precedence first: {files:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod manager;

pub use engine::{Engine, EngineStats};
pub use manager::{AutoSwitchThrottle, WorkspaceEvent, WorkspaceListener, WorkspaceManager};

pub use monoenv_cache::{CacheConfig, CacheStats, TtlCache};
pub use monoenv_core::{
    BUILTIN_PROVIDER_NAMES, CacheSettings, Detection, DetectionInfo, DetectionOutcome, EnvResolution,
    EnvScope, Error, PerformanceSettings, ProviderSettings, ProviderSpec, ResolutionStrategy,
    Result, Settings, ThrottleSettings, Workspace,
};
pub use monoenv_plugins::{HookContext, HookFn, HookPoint, PluginConfig, PluginSystem};
pub use monoenv_providers::{
    CargoWorkspacesProvider, ConfiguredProvider, LernaProvider, MonorepoProvider, NxProvider,
    TurborepoProvider, YarnWorkspacesProvider, builtin_by_name, builtin_providers,
};
pub use monoenv_resolver::{
    BulkResolver, DEFAULT_ENV_PATTERNS, DetectionRegistry, DetectionStats, EnvFileComparator,
    EnvironmentResolver, NEGATIVE_DETECTION_TTL, ResolveOptions, WorkspaceFinder,
};
