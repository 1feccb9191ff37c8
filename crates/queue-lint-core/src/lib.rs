//! # queue-lint-core
//!
//! Core types for queue-lint, a naming-convention based thread-safety
//! linter for Swift sources.
//!
//! This crate provides the value types shared by the engine, the checker
//! façade, and the CLI:
//!
//! - [`Violation`] for representing lint findings
//! - [`LintResult`] for aggregating findings across files
//! - [`QueueLintConfig`] for analyzer configuration
//!
//! The `Violation` shape is the boundary contract: downstream tooling
//! consumes it verbatim (including as JSON), so changes here are breaking.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod types;

pub use config::{ConfigError, QueueLintConfig};
pub use types::{LintResult, Location, Replacement, Severity, Suggestion, Violation};
