//! Check command implementation.

use anyhow::{Context, Result};
use queue_lint::{Checker, QueueLintConfig};
use std::path::Path;

use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    exclude: Vec<String>,
    config_flag: Option<&Path>,
) -> Result<()> {
    let source = crate::config_resolver::resolve(path, config_flag);

    let config = match &source {
        crate::config_resolver::ConfigSource::Default => QueueLintConfig::default(),
        other => {
            // Invariant: non-Default variants always have a path
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            }
            QueueLintConfig::from_file(p)
                .with_context(|| format!("Failed to load config: {}", p.display()))?
        }
    };

    config.validate().context("Config validation failed")?;
    let fail_on = config.fail_on_severity();

    let checker = Checker::builder()
        .root(path)
        .config(config)
        .excludes(exclude)
        .build()
        .context("Failed to build checker")?;

    tracing::info!("Analyzing {:?}", path);

    let result = checker.analyze().context("Analysis failed")?;

    super::output::print(&result, format)?;

    if result.has_violations_at(fail_on) {
        std::process::exit(1);
    }

    Ok(())
}
