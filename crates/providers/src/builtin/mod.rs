//! Built-in providers for the supported build-tool flavors.
//!
//! Priority ordering reflects marker specificity: `turbo.json` can only mean
//! Turborepo (priority 1), while `Cargo.toml` and `package.json` are common
//! or ambiguous markers and rank lower (5-6).

use crate::traits::MonorepoProvider;
use std::sync::Arc;

pub mod cargo;
pub mod lerna;
pub mod nx;
pub mod turborepo;
pub mod yarn;

pub use cargo::CargoWorkspacesProvider;
pub use lerna::LernaProvider;
pub use nx::NxProvider;
pub use turborepo::TurborepoProvider;
pub use yarn::YarnWorkspacesProvider;

/// All built-in providers, in priority order.
#[must_use]
pub fn builtin_providers() -> Vec<Arc<dyn MonorepoProvider>> {
    vec![
        Arc::new(TurborepoProvider),
        Arc::new(NxProvider),
        Arc::new(LernaProvider),
        Arc::new(CargoWorkspacesProvider),
        Arc::new(YarnWorkspacesProvider),
    ]
}

/// Looks up a built-in provider by its configuration name.
#[must_use]
pub fn builtin_by_name(name: &str) -> Option<Arc<dyn MonorepoProvider>> {
    match name {
        "turborepo" => Some(Arc::new(TurborepoProvider)),
        "nx" => Some(Arc::new(NxProvider)),
        "lerna" => Some(Arc::new(LernaProvider)),
        "cargo_workspaces" => Some(Arc::new(CargoWorkspacesProvider)),
        "yarn_workspaces" => Some(Arc::new(YarnWorkspacesProvider)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monoenv_core::BUILTIN_PROVIDER_NAMES;

    #[test]
    fn builtin_providers_are_priority_sorted() {
        let providers = builtin_providers();
        let priorities: Vec<u32> = providers.iter().map(|p| p.priority()).collect();

        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn every_configured_name_resolves() {
        for name in BUILTIN_PROVIDER_NAMES {
            let provider = builtin_by_name(name).unwrap();
            assert_eq!(provider.name(), name);
        }
        assert!(builtin_by_name("bazel").is_none());
    }
}
