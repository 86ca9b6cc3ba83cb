//! Shared types, errors, and configuration schema for monoenv.
//!
//! This crate carries the vocabulary the rest of the workspace speaks:
//!
//! - [`Workspace`], [`Detection`], [`DetectionOutcome`]: the data flowing
//!   from root detection through workspace discovery to env-file resolution.
//! - [`EnvResolution`] and [`ResolutionStrategy`]: how workspace and root
//!   environment files are combined.
//! - [`Error`]: setup-time failures (configuration, provider contract,
//!   plugin conflicts). Runtime lookups never error; they return empty
//!   results.
//! - [`Settings`]: the strongly-typed configuration tree with schema
//!   (`deny_unknown_fields`) and range validation.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BUILTIN_PROVIDER_NAMES, CacheSettings, PerformanceSettings, ProviderSettings, ProviderSpec,
    Settings, ThrottleSettings,
};
pub use error::{Error, Result};
pub use types::{
    Detection, DetectionInfo, DetectionOutcome, EnvResolution, EnvScope, ResolutionStrategy,
    Workspace,
};
