//! Cargo-test runner.
//!
//! [`run_check`] lets a project enforce the queue discipline from a plain
//! `cargo test` test function: it locates the project root, loads the
//! config, runs the checker, and panics with a formatted report when
//! violations reach the failure threshold.

use queue_lint_core::{QueueLintConfig, Severity};
use std::path::{Path, PathBuf};

use crate::Checker;

/// Config file names to search for, in priority order.
const CONFIG_CANDIDATES: &[&str] = &["queue-lint.toml", ".queue-lint.toml"];

/// Runs queue-lint analysis as part of `cargo test`.
///
/// `config_path` overrides the config file location; `fail_on` overrides
/// the failure threshold (`"error"`, `"warning"`, `"info"`).
///
/// # Panics
///
/// Panics with a formatted report if violations at or above the effective
/// threshold are found, or if the checker cannot be set up.
pub fn run_check(config_path: Option<&str>, fail_on: Option<&str>) {
    let root = find_project_root();
    let config = load_config(&root, config_path);
    let effective_fail_on = resolve_fail_on(fail_on, &config);

    let checker = Checker::builder()
        .root(&root)
        .config(config)
        .build()
        .unwrap_or_else(|e| {
            panic!("queue-lint: failed to build checker: {e}");
        });

    let result = checker.analyze().unwrap_or_else(|e| {
        panic!("queue-lint: analysis failed: {e}");
    });

    if result.has_violations_at(effective_fail_on) {
        let report = result.format_test_report(effective_fail_on);
        panic!("{report}");
    }
}

/// Loads the configuration, defaulting when no file is found.
fn load_config(root: &Path, explicit_path: Option<&str>) -> QueueLintConfig {
    if let Some(path) = explicit_path {
        let full_path = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            root.join(path)
        };
        return QueueLintConfig::from_file(&full_path).unwrap_or_else(|e| {
            panic!("queue-lint: failed to load {}: {e}", full_path.display());
        });
    }

    for candidate in CONFIG_CANDIDATES {
        let path = root.join(candidate);
        if path.exists() {
            return QueueLintConfig::from_file(&path).unwrap_or_else(|e| {
                panic!("queue-lint: failed to load {}: {e}", path.display());
            });
        }
    }

    QueueLintConfig::default()
}

/// Resolves the effective `fail_on` severity from arg > config > default.
fn resolve_fail_on(arg: Option<&str>, config: &QueueLintConfig) -> Severity {
    let name = arg.or(config.fail_on.as_deref()).unwrap_or("error");

    match name {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "info" => Severity::Info,
        other => {
            panic!("queue-lint: unknown severity `{other}`. Valid values: error, warning, info")
        }
    }
}

/// Checks whether a `Cargo.toml` file defines a `[workspace]` section
/// by parsing as TOML, avoiding false positives from comments or strings.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table.contains_key("workspace")
}

/// Finds the project root by walking up from `CARGO_MANIFEST_DIR`.
fn find_project_root() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let manifest_path = PathBuf::from(&manifest_dir);

        let mut candidate = manifest_path.as_path();
        loop {
            let cargo_toml = candidate.join("Cargo.toml");
            if cargo_toml.exists() && has_workspace_section(&cargo_toml) {
                return candidate.to_path_buf();
            }
            match candidate.parent() {
                Some(parent) => candidate = parent,
                None => break,
            }
        }

        return manifest_path;
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
