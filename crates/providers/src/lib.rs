//! Monorepo providers: how each build-tool flavor is recognized and resolved.
//!
//! A provider answers four questions about one build-tool flavor:
//!
//! 1. Is this directory a monorepo root? ([`MonorepoProvider::detect`],
//!    returning a confidence score in `[0, 100]`)
//! 2. Where do its workspaces live?
//!    ([`MonorepoProvider::workspace_patterns`])
//! 3. How do environment files resolve for a workspace?
//!    ([`MonorepoProvider::env_resolution`])
//! 4. What marker file makes a workspace directory valid?
//!    ([`MonorepoProvider::package_managers`])
//!
//! Five built-in providers cover Turborepo, Nx, Lerna, Cargo workspaces, and
//! Yarn/npm workspaces; [`ConfiguredProvider`] builds additional providers
//! from declarative [`ProviderSpec`](monoenv_core::ProviderSpec)
//! configuration or a custom detection function.
//!
//! # Example
//!
//! ```no_run
//! use monoenv_providers::{MonorepoProvider, TurborepoProvider};
//! use std::path::Path;
//!
//! let detection = TurborepoProvider.detect(Path::new("/repo"));
//! if detection.is_match() {
//!     println!("turborepo root, confidence {}", detection.confidence);
//! }
//! ```

pub mod builtin;
pub mod factory;
pub mod traits;

mod util;

pub use builtin::{
    CargoWorkspacesProvider, LernaProvider, NxProvider, TurborepoProvider, YarnWorkspacesProvider,
    builtin_by_name, builtin_providers,
};
pub use factory::{ConfiguredProvider, DetectFn, DetectionRule};
pub use traits::{MonorepoProvider, defaults};
