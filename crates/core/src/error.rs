//! Error types shared across the monoenv crates.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for monoenv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during engine setup and registration.
///
/// Runtime lookups (no monorepo detected, no workspace for a file, no env
/// files found) are deliberately *not* errors; they return empty results.
/// The variants here cover broken integrations: invalid configuration,
/// malformed provider registrations, and plugin conflicts.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration failed schema or range validation.
    #[error("Invalid configuration: {}", issues.join("; "))]
    #[diagnostic(
        code(monoenv::core::invalid_config),
        help("Fix the listed configuration fields before constructing the engine")
    )]
    InvalidConfig {
        /// Every violation found during validation, not just the first.
        issues: Vec<String>,
    },

    /// A provider failed its registration contract.
    #[error("Provider '{name}' violates the provider contract: {message}")]
    #[diagnostic(
        code(monoenv::core::provider_contract),
        help("Providers must expose a non-empty unique name and a detect implementation")
    )]
    ProviderContract {
        /// Name of the offending provider (may be empty when that is the violation).
        name: String,
        /// Description of the violated requirement.
        message: String,
    },

    /// A provider with the same name is already registered.
    #[error("Provider '{name}' is already registered")]
    #[diagnostic(
        code(monoenv::core::duplicate_provider),
        help("Unregister the existing provider first, or pick a different name")
    )]
    DuplicateProvider {
        /// The conflicting provider name.
        name: String,
    },

    /// A plugin with the same name is already registered.
    #[error("Plugin '{name}' is already registered")]
    #[diagnostic(
        code(monoenv::core::plugin_conflict),
        help("Plugin names must be unique; unregister the existing plugin first")
    )]
    PluginConflict {
        /// The conflicting plugin name.
        name: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monoenv::core::io_error),
        help("Check that the referenced paths exist and that you have permission to read them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monoenv::core::json_error),
        help("Ensure the JSON has valid syntax and matches the configuration schema")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_lists_every_issue() {
        let error = Error::InvalidConfig {
            issues: vec![
                "performance.cache.max_entries must be in [10, 10000]".to_string(),
                "providers.builtin contains unknown provider 'maven'".to_string(),
            ],
        };

        let message = error.to_string();
        assert!(message.contains("max_entries"));
        assert!(message.contains("maven"));
    }

    #[test]
    fn provider_contract_error_display() {
        let error = Error::ProviderContract {
            name: String::new(),
            message: "name must not be empty".to_string(),
        };

        assert!(error.to_string().contains("name must not be empty"));
    }

    #[test]
    fn io_error_display_with_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io {
            source: io_error,
            path: Some(PathBuf::from("/etc/monoenv.json")),
            operation: "reading configuration".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("I/O error during reading configuration"));
        assert!(message.contains("/etc/monoenv.json"));
    }

    #[test]
    fn io_error_display_without_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = Error::Io {
            source: io_error,
            path: None,
            operation: "opening directory".to_string(),
        };

        assert!(!error.to_string().contains(" at "));
    }

    #[test]
    fn diagnostic_codes_present() {
        use miette::Diagnostic;

        let error = Error::DuplicateProvider {
            name: "turborepo".to_string(),
        };
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("monoenv::core::duplicate_provider".to_string())
        );
        assert!(error.help().is_some());
    }

    #[test]
    fn json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error: Error = json_error.into();

        match error {
            Error::Json { path, .. } => assert_eq!(path, None),
            other => panic!("expected Json variant, got {other:?}"),
        }
    }
}
