//! # queue-lint-swift
//!
//! Tree-sitter based Swift engine for queue-lint.
//!
//! Swift types opting into the `ThreadSafe` convention must underscore-
//! prefix their mutable state and access it only through a serial queue's
//! wrapper methods. This crate parses Swift sources and enforces that
//! discipline with a context-sensitive syntax-tree visitor:
//!
//! - [`SwiftParser`] lowers tree-sitter CSTs into the [`syntax`] tree
//! - [`QueueRuleEngine`] applies the rules per file
//! - [`classify`] holds the swappable heuristics (closure roles, queue
//!   targets, call resolution)
//!
//! The engine is a synchronous depth-first walk with no shared state
//! between files; callers may analyze files in parallel freely.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
mod context;
pub mod engine;
pub mod parser;
pub mod rules;
pub mod syntax;
mod visitor;

pub use engine::{is_eligible, FileIndex, QueueRuleEngine, ELIGIBILITY_MARKER};
pub use parser::{LanguageParser, SwiftParser};
pub use rules::{RuleInfo, ALL_RULES};
pub use syntax::SourceFile;
