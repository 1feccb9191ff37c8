//! Checker façade: scanner → parser → engine → result.
//!
//! Discovers eligible source files under a root, runs the rule engine on
//! each, and aggregates an ordered [`LintResult`]. Per-file failures are
//! tolerated: unreadable files are skipped with a warning and a file the
//! parser cannot make sense of simply contributes no violations.

use std::path::{Path, PathBuf};

use queue_lint_core::{LintResult, QueueLintConfig};
use queue_lint_swift::{LanguageParser, QueueRuleEngine, SwiftParser};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while setting up or running a check.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// IO error during file discovery.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] queue_lint_core::ConfigError),

    /// File discovery failed.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Builder for configuring a [`Checker`].
#[derive(Default)]
pub struct CheckerBuilder {
    root: Option<PathBuf>,
    config: Option<QueueLintConfig>,
    exclude_patterns: Vec<String>,
}

impl CheckerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: QueueLintConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds an exclude path substring.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude path substrings.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Builds the checker.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn build(self) -> Result<Checker, CheckerError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let root = self.root.unwrap_or_else(|| PathBuf::from("."));
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.exclude_patterns.clone());

        Ok(Checker {
            root,
            exclude_patterns,
            parser: SwiftParser::new(),
            engine: QueueRuleEngine::new(config),
        })
    }
}

/// Orchestrates scanning, parsing, and the rule engine.
///
/// Use [`Checker::builder()`] to construct an instance.
pub struct Checker {
    root: PathBuf,
    exclude_patterns: Vec<String>,
    parser: SwiftParser,
    engine: QueueRuleEngine,
}

impl Checker {
    /// Creates a new builder for configuring a checker.
    #[must_use]
    pub fn builder() -> CheckerBuilder {
        CheckerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Analyzes all discovered files and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails; per-file read failures
    /// are skipped with a warning instead.
    pub fn analyze(&self) -> Result<LintResult, CheckerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let mut result = LintResult::new();
        for path in &files {
            debug!("Analyzing: {}", path.display());

            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {e}", path.display());
                    continue;
                }
            };

            let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
            let tree = self.parser.parse(&source);
            result
                .violations
                .extend(self.engine.analyze(&tree, &relative));
            result.files_checked += 1;
        }

        result.violations.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Discovers source files the parser handles, honoring excludes.
    fn discover_files(&self) -> Result<Vec<PathBuf>, CheckerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder.hidden(false).git_ignore(true);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_default();
            if !self.parser.extensions().contains(&ext.as_str()) {
                continue;
            }

            if self.is_excluded(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Exclude patterns are path substrings; glob-ish `**` decorations
    /// from hand-migrated configs are tolerated by stripping them.
    fn is_excluded(&self, path: &Path) -> bool {
        let rel = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        self.exclude_patterns.iter().any(|pattern| {
            let clean = pattern.replace("**/", "").replace("/**", "");
            !clean.is_empty() && rel.contains(&clean)
        })
    }
}
