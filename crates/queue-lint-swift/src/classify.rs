//! Classification policies used by the rule visitor.
//!
//! Everything heuristic lives here as plain data and small pure functions:
//! closure roles, queue-target classification, the call allowlist, and
//! same-file call resolution. The visitor stays free of scattered
//! conditionals and each policy is unit-testable on its own.

use queue_lint_core::QueueLintConfig;

use crate::engine::FileIndex;
use crate::syntax::{CallExpr, Expr};

/// The synchronization-queue primitive type name.
pub const QUEUE_TYPE: &str = "DispatchQueue";

/// Call targets that hand their closure to a new, independent execution
/// context. Timing relative to the current protected region is unknown,
/// so protection must not leak into these closures.
const ESCAPING_DISPATCH: &[&str] = &[
    "async",
    "asyncAfter",
    "Task",
    "detached",
    "detachNewThread",
    "addOperation",
    "concurrentPerform",
];

/// Call targets allowed from guarded functions without the underscore
/// prefix: standard collection mutators and queries, diagnostics, and
/// basic value constructors.
const ALLOWED_CALLS: &[&str] = &[
    // collection mutators and queries
    "append",
    "insert",
    "remove",
    "removeAll",
    "removeFirst",
    "removeLast",
    "removeValue",
    "updateValue",
    "popLast",
    "reserveCapacity",
    "contains",
    "firstIndex",
    "lastIndex",
    "index",
    "sorted",
    "sort",
    "map",
    "compactMap",
    "flatMap",
    "filter",
    "forEach",
    "reduce",
    "joined",
    "enumerated",
    "prefix",
    "suffix",
    "min",
    "max",
    // diagnostics
    "print",
    "debugPrint",
    "dump",
    "assert",
    "assertionFailure",
    "precondition",
    "preconditionFailure",
    "fatalError",
    "NSLog",
    // basic value constructors
    "String",
    "Int",
    "Int64",
    "UInt",
    "Double",
    "Float",
    "Bool",
    "Array",
    "Dictionary",
    "Set",
    "Data",
    "Date",
    "UUID",
    "URL",
    "IndexPath",
    "abs",
    "stride",
    "zip",
];

/// Returns whether a name carries the guarded-prefix marker.
#[must_use]
pub fn is_guarded_name(name: &str) -> bool {
    name.starts_with('_')
}

/// Role of a closure relative to the protection stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureRole {
    /// Trailing block of a wrapper call: inherits protection.
    WrapperBody,
    /// Handed to a new execution context: protection resets for the body.
    EscapingDispatch,
    /// Anything else; timing is unknown, so protection resets too.
    OpaqueCallback,
}

/// Swappable closure-role policy.
///
/// Arguments: the call's target name, whether that target is a recognized
/// wrapper, and whether the closure is the trailing block of the call.
pub type ClosureClassifier = fn(Option<&str>, bool, bool) -> ClosureRole;

/// Default closure-role policy.
///
/// This is call-shape pattern matching, not escape analysis: a trailing
/// block of a wrapper call is the wrapper body, known dispatch primitives
/// escape, and everything else is treated as an opaque callback.
#[must_use]
pub fn classify_closure(target: Option<&str>, is_wrapper: bool, is_trailing: bool) -> ClosureRole {
    if is_wrapper && is_trailing {
        return ClosureRole::WrapperBody;
    }
    if let Some(name) = target {
        if ESCAPING_DISPATCH.contains(&name) {
            return ClosureRole::EscapingDispatch;
        }
    }
    ClosureRole::OpaqueCallback
}

/// What a wrapper call's receiver resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueTarget {
    /// A queue property of the enclosing type.
    OwnProperty(String),
    /// `DispatchQueue.main`.
    SharedMain,
    /// `DispatchQueue.global(...)`.
    SharedGlobal,
    /// A queue constructed at the call site, with its label if literal.
    Inline(Option<String>),
    /// Some other receiver: a parameter, a local, another object's queue.
    External(String),
    /// No receiver: a detected wrapper or implicit `self`.
    Unqualified,
}

impl QueueTarget {
    /// The queue identity string used for consistency tracking.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        match self {
            Self::OwnProperty(name) | Self::External(name) => Some(name.clone()),
            Self::SharedMain => Some("DispatchQueue.main".to_string()),
            Self::SharedGlobal => Some("DispatchQueue.global()".to_string()),
            Self::Inline(Some(label)) => Some(label.clone()),
            Self::Inline(None) => Some("anonymous queue".to_string()),
            Self::Unqualified => None,
        }
    }

    /// Whether this is a shared process-wide queue singleton.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::SharedMain | Self::SharedGlobal)
    }
}

/// Returns whether a queue identity names a shared singleton.
#[must_use]
pub fn is_shared_identity(identity: &str) -> bool {
    identity == "DispatchQueue.main" || identity == "DispatchQueue.global()"
}

/// Classifies the receiver of a wrapper call against the enclosing type's
/// queue properties.
#[must_use]
pub fn classify_queue_target(receiver: Option<&Expr>, queue_properties: &[String]) -> QueueTarget {
    let Some(receiver) = receiver else {
        return QueueTarget::Unqualified;
    };

    let named = |name: &str| {
        if queue_properties.iter().any(|p| p == name) {
            QueueTarget::OwnProperty(name.to_string())
        } else {
            QueueTarget::External(name.to_string())
        }
    };

    match receiver {
        Expr::Identifier(id) => named(&id.name),
        Expr::SelfRef(_) => QueueTarget::Unqualified,
        Expr::Member(m) => match m.base.as_ref() {
            Expr::SelfRef(_) => named(&m.member),
            Expr::Identifier(base) if base.name == QUEUE_TYPE && m.member == "main" => {
                QueueTarget::SharedMain
            }
            _ => QueueTarget::External(expr_text(receiver)),
        },
        Expr::Call(call) => {
            let global = call.target_name() == Some("global")
                && matches!(
                    call.receiver(),
                    Some(Expr::Identifier(id)) if id.name == QUEUE_TYPE
                );
            if global {
                QueueTarget::SharedGlobal
            } else if is_queue_construction(call) {
                QueueTarget::Inline(call.string_argument("label").map(ToString::to_string))
            } else {
                QueueTarget::External(expr_text(receiver))
            }
        }
        _ => QueueTarget::External(expr_text(receiver)),
    }
}

/// Returns whether a call constructs the queue primitive.
#[must_use]
pub fn is_queue_construction(call: &CallExpr) -> bool {
    call.receiver().is_none() && call.target_name() == Some(QUEUE_TYPE)
}

/// Renders an expression as display text for diagnostics.
#[must_use]
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(id) => id.name.clone(),
        Expr::SelfRef(_) => "self".to_string(),
        Expr::Member(m) => format!("{}.{}", expr_text(&m.base), m.member),
        Expr::Call(c) => format!("{}()", expr_text(&c.callee)),
        Expr::Closure(_) => "{ ... }".to_string(),
        Expr::Assign(a) => expr_text(&a.target),
        Expr::StringLit(s) => format!("\"{}\"", s.value),
    }
}

/// Outcome of resolving a call target from inside a guarded function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResolution {
    /// Guarded, allowlisted, or callback-named: safe to call.
    SameFileSafe,
    /// Resolves to an unguarded declaration in this file.
    SameFileUnsafe,
    /// Not declared in this file; cross-file resolution is out of scope.
    Unresolved,
}

/// Resolves a call target name against same-file declarations.
#[must_use]
pub fn resolve_call(name: &str, config: &QueueLintConfig, index: &FileIndex) -> CallResolution {
    if is_guarded_name(name) || ALLOWED_CALLS.contains(&name) || config.is_callback_name(name) {
        return CallResolution::SameFileSafe;
    }
    if index.has_function(name) {
        return CallResolution::SameFileUnsafe;
    }
    CallResolution::Unresolved
}
