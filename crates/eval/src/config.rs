//! Orchestrator configuration, loadable from TOML.
//!
//! ```toml
//! context_lines = 3
//! dump_heap = false
//! ignored_marker = "[W] Statement ignored at line"
//! ```

use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_IGNORED_MARKER: &str = "[W] Statement ignored at line";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Source lines shown before and after a failing line.
    pub context_lines: usize,
    /// Include the data scope in execution-time failure reports.
    pub dump_heap: bool,
    /// Log marker the default ignored-statement scraper looks for.
    pub ignored_marker: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            context_lines: 2,
            dump_heap: true,
            ignored_marker: DEFAULT_IGNORED_MARKER.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ExecConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(ExecConfig::from_toml_str("").unwrap(), ExecConfig::default());
    }

    #[test]
    fn partial_config_overrides() {
        let config = ExecConfig::from_toml_str("context_lines = 0\ndump_heap = false").unwrap();
        assert_eq!(config.context_lines, 0);
        assert!(!config.dump_heap);
        assert_eq!(config.ignored_marker, DEFAULT_IGNORED_MARKER);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ExecConfig::from_toml_str("contxt_lines = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ignored_marker = \"SKIP\"").unwrap();
        let config = ExecConfig::load(file.path()).unwrap();
        assert_eq!(config.ignored_marker, "SKIP");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ExecConfig::load(&dir.path().join("nope.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
