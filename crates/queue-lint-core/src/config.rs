//! TOML configuration for queue-lint.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Severity;

/// Wrapper methods recognized when no configuration overrides them.
const DEFAULT_WRAPPER_METHODS: &[&str] = &["sync", "async"];

/// Name suffixes that mark a call target as a callback rather than a
/// same-object function (see the guarded-function call rule).
const DEFAULT_CALLBACK_SUFFIXES: &[&str] =
    &["Handler", "Callback", "Completion", "Continuation", "Block"];

/// Top-level queue-lint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueLintConfig {
    /// Severity threshold for failure (default: "error").
    pub fail_on: Option<String>,

    /// Path substrings to exclude from analysis. Empty = skip nothing.
    pub exclude_patterns: Vec<String>,

    /// Ordered set of method names that grant queue protection to their
    /// trailing closure. Duplicates are dropped, first occurrence wins.
    pub queue_wrapper_methods: Vec<String>,

    /// Name suffixes treated as callbacks when called from guarded
    /// functions. The literal name `completion` is always accepted.
    pub callback_suffixes: Vec<String>,

    /// Surface calls that cannot be resolved in the same file as
    /// low-confidence warnings instead of staying silent.
    pub warn_unresolved_calls: bool,
}

impl Default for QueueLintConfig {
    fn default() -> Self {
        Self {
            fail_on: None,
            exclude_patterns: Vec::new(),
            queue_wrapper_methods: DEFAULT_WRAPPER_METHODS
                .iter()
                .map(ToString::to_string)
                .collect(),
            callback_suffixes: DEFAULT_CALLBACK_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            warn_unresolved_calls: false,
        }
    }
}

/// Errors when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
    /// Config is structurally invalid.
    #[error("config validation: {0}")]
    Validation(String),
}

impl QueueLintConfig {
    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse from a TOML string.
    ///
    /// Missing sections fall back to defaults, so an empty string is a
    /// valid configuration.
    ///
    /// # Errors
    ///
    /// Returns error if TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        /// Wrapper to handle `[analyzer]` and `[engine]` sections.
        #[derive(Deserialize)]
        struct RawConfig {
            #[serde(default)]
            fail_on: Option<String>,
            #[serde(default)]
            analyzer: AnalyzerSection,
            #[serde(default)]
            engine: EngineSection,
        }

        #[derive(Deserialize, Default)]
        struct AnalyzerSection {
            #[serde(default)]
            exclude: Vec<String>,
        }

        #[derive(Deserialize)]
        struct EngineSection {
            #[serde(default = "default_wrappers")]
            queue_wrapper_methods: Vec<String>,
            #[serde(default = "default_suffixes")]
            callback_suffixes: Vec<String>,
            #[serde(default)]
            warn_unresolved_calls: bool,
        }

        impl Default for EngineSection {
            fn default() -> Self {
                Self {
                    queue_wrapper_methods: default_wrappers(),
                    callback_suffixes: default_suffixes(),
                    warn_unresolved_calls: false,
                }
            }
        }

        fn default_wrappers() -> Vec<String> {
            DEFAULT_WRAPPER_METHODS
                .iter()
                .map(ToString::to_string)
                .collect()
        }

        fn default_suffixes() -> Vec<String> {
            DEFAULT_CALLBACK_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect()
        }

        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        Ok(Self {
            fail_on: raw.fail_on,
            exclude_patterns: raw.analyzer.exclude,
            queue_wrapper_methods: dedup_ordered(raw.engine.queue_wrapper_methods),
            callback_suffixes: raw.engine.callback_suffixes,
            warn_unresolved_calls: raw.engine.warn_unresolved_calls,
        })
    }

    /// Validate config consistency.
    ///
    /// # Errors
    ///
    /// Returns error describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_wrapper_methods.is_empty() {
            return Err(ConfigError::Validation(
                "engine.queue_wrapper_methods must not be empty".to_string(),
            ));
        }

        for method in &self.queue_wrapper_methods {
            if method.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "engine.queue_wrapper_methods: empty method name".to_string(),
                ));
            }
        }

        for pattern in &self.exclude_patterns {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "analyzer.exclude: empty pattern".to_string(),
                ));
            }
        }

        if let Some(name) = &self.fail_on {
            if !matches!(name.as_str(), "error" | "warning" | "info") {
                return Err(ConfigError::Validation(format!(
                    "fail_on: unknown severity '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Returns whether a method name grants queue protection.
    #[must_use]
    pub fn is_wrapper_method(&self, name: &str) -> bool {
        self.queue_wrapper_methods.iter().any(|m| m == name)
    }

    /// Returns whether a call-target name matches the callback heuristic.
    #[must_use]
    pub fn is_callback_name(&self, name: &str) -> bool {
        name == "completion" || self.callback_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Returns the effective failure threshold.
    #[must_use]
    pub fn fail_on_severity(&self) -> Severity {
        match self.fail_on.as_deref() {
            Some("warning") => Severity::Warning,
            Some("info") => Severity::Info,
            _ => Severity::Error,
        }
    }
}

/// Drops duplicate entries, keeping first occurrences in order.
fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = QueueLintConfig::parse("").expect("parse failed");
        assert_eq!(config.queue_wrapper_methods, vec!["sync", "async"]);
        assert!(config.exclude_patterns.is_empty());
        assert!(!config.warn_unresolved_calls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
fail_on = "warning"

[analyzer]
exclude = ["Carthage/", ".build/"]

[engine]
queue_wrapper_methods = ["sync", "async", "withLock"]
callback_suffixes = ["Handler", "Closure"]
warn_unresolved_calls = true
"#;
        let config = QueueLintConfig::parse(toml).expect("parse failed");
        assert_eq!(config.exclude_patterns.len(), 2);
        assert_eq!(config.queue_wrapper_methods.len(), 3);
        assert!(config.warn_unresolved_calls);
        assert_eq!(config.fail_on_severity(), Severity::Warning);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn wrapper_methods_are_deduplicated_in_order() {
        let toml = r#"
[engine]
queue_wrapper_methods = ["withLock", "sync", "withLock", "async", "sync"]
"#;
        let config = QueueLintConfig::parse(toml).expect("parse failed");
        assert_eq!(config.queue_wrapper_methods, vec!["withLock", "sync", "async"]);
    }

    #[test]
    fn validate_rejects_empty_wrapper_set() {
        let toml = r#"
[engine]
queue_wrapper_methods = []
"#;
        let config = QueueLintConfig::parse(toml).expect("parse failed");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_fail_on() {
        let toml = r#"fail_on = "critical""#;
        let config = QueueLintConfig::parse(toml).expect("parse failed");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("critical"));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = QueueLintConfig::parse("[engine").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn callback_heuristic_accepts_suffixes_and_literal_completion() {
        let config = QueueLintConfig::default();
        assert!(config.is_callback_name("completion"));
        assert!(config.is_callback_name("successHandler"));
        assert!(config.is_callback_name("onDoneCallback"));
        assert!(!config.is_callback_name("flush"));
    }

    #[test]
    fn fail_on_defaults_to_error() {
        let config = QueueLintConfig::default();
        assert_eq!(config.fail_on_severity(), Severity::Error);
    }
}
