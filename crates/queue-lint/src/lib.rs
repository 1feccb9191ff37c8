//! # queue-lint
//!
//! Naming-convention thread-safety linter for Swift sources.
//!
//! Classes opting into the `ThreadSafe` convention must underscore-prefix
//! their mutable state and touch it only through their serial queue's
//! wrapper methods. queue-lint checks that discipline statically.
//!
//! ## Quick Start — `cargo test` Integration
//!
//! ```toml
//! [dev-dependencies]
//! queue-lint = "0.3"
//! ```
//!
//! ```rust,ignore
//! // tests/thread_safety.rs
//! #[test]
//! fn swift_queue_discipline() {
//!     queue_lint::run_check(None, None);
//! }
//! ```
//!
//! Configure via `queue-lint.toml` in the project root.
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use queue_lint::Checker;
//!
//! let checker = Checker::builder()
//!     .root("./Sources")
//!     .build()?;
//!
//! let result = checker.analyze()?;
//! result.print_report();
//! ```

#![forbid(unsafe_code)]

// Re-export core types and the engine surface.
pub use queue_lint_core::*;
pub use queue_lint_swift::{
    is_eligible, LanguageParser, QueueRuleEngine, SourceFile, SwiftParser, ALL_RULES,
    ELIGIBILITY_MARKER,
};

mod checker;
mod runner;

pub use checker::{Checker, CheckerBuilder, CheckerError};
pub use runner::run_check;
