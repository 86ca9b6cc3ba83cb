//! Lenient marker-file readers.
//!
//! Detection treats a malformed marker file as "present but uninformative":
//! the provider still reports the marker, it just forfeits the parse bonus
//! and metadata. These helpers therefore return `Option` and log recovered
//! failures at debug level instead of propagating errors.

use std::fs;
use std::path::Path;

/// Reads and parses a JSON marker file; `None` on any I/O or parse failure.
pub(crate) fn read_json_lenient(path: &Path) -> Option<serde_json::Value> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(
                path = %path.display(),
                %error,
                "marker file is not valid JSON; counting marker without parse bonus"
            );
            None
        }
    }
}

/// Reads and parses a YAML marker file; `None` on any I/O or parse failure.
pub(crate) fn read_yaml_lenient(path: &Path) -> Option<serde_yaml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match serde_yaml::from_str(&content) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(
                path = %path.display(),
                %error,
                "marker file is not valid YAML; counting marker without parse bonus"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_json_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("turbo.json");
        fs::write(&path, r#"{"pipeline": {}}"#).unwrap();

        let value = read_json_lenient(&path).unwrap();
        assert!(value.get("pipeline").is_some());
    }

    #[test]
    fn invalid_json_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("turbo.json");
        fs::write(&path, "{ broken").unwrap();

        assert!(read_json_lenient(&path).is_none());
    }

    #[test]
    fn missing_file_is_none() {
        assert!(read_json_lenient(Path::new("/nonexistent/nx.json")).is_none());
    }

    #[test]
    fn valid_yaml_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pnpm-workspace.yaml");
        fs::write(&path, "packages:\n  - 'packages/*'\n").unwrap();

        let value = read_yaml_lenient(&path).unwrap();
        assert!(value.get("packages").is_some());
    }
}
