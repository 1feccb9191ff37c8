//! Rule metadata and violation constructors.
//!
//! Codes, names, and message wording live here so the visitor stays free
//! of string formatting and `list-rules` can enumerate the rule set.

use queue_lint_core::{Location, Replacement, Severity, Suggestion, Violation};

use crate::syntax::Span;
use std::path::Path;

/// Static description of one rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    /// Rule code (e.g., "QL001").
    pub code: &'static str,
    /// Kebab-case rule name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Guarded state accessed without queue protection.
pub const UNGUARDED_STATE_ACCESS: RuleInfo = RuleInfo {
    code: "QL001",
    name: "unguarded-state-access",
    description: "Guarded state must be accessed through queue protection",
};

/// Mutable member without the underscore prefix.
pub const MISSING_UNDERSCORE_PREFIX: RuleInfo = RuleInfo {
    code: "QL002",
    name: "missing-underscore-prefix",
    description: "Mutable members of thread-safe types need the underscore prefix",
};

/// Underscore member not declared private.
pub const UNDERSCORE_NOT_PRIVATE: RuleInfo = RuleInfo {
    code: "QL003",
    name: "underscore-not-private",
    description: "Underscore items must be private",
};

/// Guarded function calling an unguarded same-file function.
pub const GUARDED_CALLS_UNGUARDED: RuleInfo = RuleInfo {
    code: "QL004",
    name: "guarded-calls-unguarded",
    description: "Guarded functions may only call guarded or allowlisted functions",
};

/// Queue operation inside a guarded function.
pub const QUEUE_OP_IN_GUARDED: RuleInfo = RuleInfo {
    code: "QL005",
    name: "queue-op-in-guarded",
    description: "Guarded functions must not re-enter queue operations",
};

/// State protected by more than one queue.
pub const MULTIPLE_QUEUES: RuleInfo = RuleInfo {
    code: "QL006",
    name: "multiple-queues",
    description: "Each piece of guarded state must be confined to a single queue",
};

/// Questionable queue declaration or shared-queue protection.
pub const QUEUE_DECLARATION: RuleInfo = RuleInfo {
    code: "QL007",
    name: "queue-declaration",
    description: "One stored private serial queue per type; no shared or inline queues",
};

/// All rules, in code order.
pub const ALL_RULES: &[RuleInfo] = &[
    UNGUARDED_STATE_ACCESS,
    MISSING_UNDERSCORE_PREFIX,
    UNDERSCORE_NOT_PRIVATE,
    GUARDED_CALLS_UNGUARDED,
    QUEUE_OP_IN_GUARDED,
    MULTIPLE_QUEUES,
    QUEUE_DECLARATION,
];

fn location(file: &Path, span: Span) -> Location {
    Location::new(file.to_path_buf(), span.line, span.column).with_span(span.offset, span.length)
}

fn violation(rule: RuleInfo, severity: Severity, file: &Path, span: Span, message: String) -> Violation {
    Violation::new(rule.code, rule.name, severity, location(file, span), message)
}

/// QL001: direct access to guarded state outside protection.
pub(crate) fn unguarded_access(file: &Path, span: Span, function: &str, item: &str) -> Violation {
    violation(
        UNGUARDED_STATE_ACCESS,
        Severity::Error,
        file,
        span,
        format!("Function '{function}' cannot directly access {item}. Use queue protection."),
    )
}

/// QL002: mutable member without the underscore prefix.
pub(crate) fn missing_prefix(file: &Path, span: Span, name: &str) -> Violation {
    let renamed = format!("_{name}");
    violation(
        MISSING_UNDERSCORE_PREFIX,
        Severity::Error,
        file,
        span,
        format!("Mutable property '{name}' must use underscore-style prefix for thread safety"),
    )
    .with_suggestion(Suggestion::with_fix(
        format!("Rename to '{renamed}'"),
        Replacement::new(location(file, span), renamed),
    ))
}

/// QL003: underscore member that is not private.
pub(crate) fn not_private(file: &Path, span: Span, name: &str) -> Violation {
    violation(
        UNDERSCORE_NOT_PRIVATE,
        Severity::Error,
        file,
        span,
        format!("'{name}' must be private. Underscore items must be private."),
    )
    .with_suggestion(Suggestion::new(format!("Declare '{name}' as private")))
}

/// QL004: guarded function calling an unguarded same-file function.
pub(crate) fn unguarded_call(file: &Path, span: Span, function: &str, callee: &str) -> Violation {
    violation(
        GUARDED_CALLS_UNGUARDED,
        Severity::Error,
        file,
        span,
        format!(
            "Guarded function '{function}' cannot call non-guarded function '{callee}'. \
             This can cause deadlocks"
        ),
    )
}

/// QL004 (advisory): call target not declared in this file.
pub(crate) fn unresolved_call(file: &Path, span: Span, function: &str, callee: &str) -> Violation {
    violation(
        GUARDED_CALLS_UNGUARDED,
        Severity::Warning,
        file,
        span,
        format!(
            "Guarded function '{function}' calls '{callee}', which is not declared in this file \
             and cannot be verified"
        ),
    )
}

/// QL005: queue operation inside a guarded function.
pub(crate) fn queue_op_in_guarded(file: &Path, span: Span, function: &str) -> Violation {
    violation(
        QUEUE_OP_IN_GUARDED,
        Severity::Error,
        file,
        span,
        format!("Guarded function '{function}' cannot use queue operations. This will cause deadlock."),
    )
}

/// QL006: state protected by two different queues.
pub(crate) fn multiple_queues(
    file: &Path,
    span: Span,
    state: &str,
    first: &str,
    second: &str,
) -> Violation {
    violation(
        MULTIPLE_QUEUES,
        Severity::Error,
        file,
        span,
        format!("{state} accessed by multiple queues ({first} and {second}). Use a single queue."),
    )
}

/// QL007: a second queue property in the same type.
pub(crate) fn second_queue_property(file: &Path, span: Span, ty: &str, name: &str, first: &str) -> Violation {
    violation(
        QUEUE_DECLARATION,
        Severity::Error,
        file,
        span,
        format!("Type '{ty}' declares a second queue '{name}' ('{first}' already exists). Use a single queue."),
    )
}

/// QL007: queue constructed inline instead of stored as a property.
pub(crate) fn inline_queue(file: &Path, span: Span) -> Violation {
    violation(
        QUEUE_DECLARATION,
        Severity::Error,
        file,
        span,
        "Queue constructed inline rather than stored as a property. Use a single stored queue."
            .to_string(),
    )
}

/// QL007: guarded state protected by a shared queue singleton.
pub(crate) fn shared_queue_access(file: &Path, span: Span, state: &str, queue: &str) -> Violation {
    violation(
        QUEUE_DECLARATION,
        Severity::Error,
        file,
        span,
        format!("{state} is protected by shared queue '{queue}'. Use a private serial queue."),
    )
}
