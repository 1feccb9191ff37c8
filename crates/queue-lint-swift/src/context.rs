//! Per-type traversal context.
//!
//! All state the rules need while walking one type lives here: the
//! protection stack, the queue-identity stack that parallels it, the
//! auto-detected wrapper map, and the state-to-queue usage map. The stacks
//! push and pop in strict LIFO order matching tree descent and ascent;
//! the helpers below keep that symmetry in one place.
//!
//! A context is owned by exactly one [`crate::visitor::TypeVisitor`] and
//! dropped when the type's subtree walk completes, so sibling types in a
//! file never share detected wrappers or queue usage.

use std::collections::HashMap;

use crate::classify::is_guarded_name;

/// Saved protection state around a closure whose timing is unknown.
#[derive(Debug, Default)]
pub struct ProtectionSnapshot {
    protection: Vec<bool>,
    queues: Vec<String>,
}

/// Mutable traversal state for one type declaration.
#[derive(Debug, Default)]
pub struct TypeContext {
    /// Name of the function currently being visited.
    pub current_function: Option<String>,
    /// Whether that function carries the guarded prefix.
    pub in_guarded_function: bool,
    /// Wrapper methods detected on this type, mapped to the identity of
    /// the queue their body dispatches to (when it could be derived).
    pub detected_wrappers: HashMap<String, Option<String>>,
    /// Which queue identity protects each piece of guarded state.
    pub queue_usage: HashMap<String, String>,
    protection: Vec<bool>,
    queue_stack: Vec<String>,
}

impl TypeContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a member function's body.
    pub fn enter_function(&mut self, name: &str) {
        self.current_function = Some(name.to_string());
        self.in_guarded_function = is_guarded_name(name);
    }

    /// Leaves the current function. Protection never outlives a body.
    pub fn exit_function(&mut self) {
        debug_assert!(self.protection.is_empty(), "protection stack out of balance");
        self.current_function = None;
        self.in_guarded_function = false;
        self.protection.clear();
        self.queue_stack.clear();
    }

    /// Whether the current position is inside a protected region.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.protection.contains(&true)
    }

    /// Identity of the queue protecting the innermost active region.
    #[must_use]
    pub fn current_queue(&self) -> Option<&str> {
        self.queue_stack.last().map(String::as_str)
    }

    /// Enters a wrapper call's trailing block.
    pub fn enter_protected(&mut self, queue: String) {
        self.protection.push(true);
        self.queue_stack.push(queue);
    }

    /// Leaves a wrapper call's trailing block.
    pub fn exit_protected(&mut self) {
        debug_assert!(!self.protection.is_empty(), "protection stack underflow");
        self.protection.pop();
        self.queue_stack.pop();
    }

    /// Suspends protection for a closure body whose execution timing is
    /// unknown. Pair with [`Self::resume`].
    #[must_use]
    pub fn suspend(&mut self) -> ProtectionSnapshot {
        ProtectionSnapshot {
            protection: std::mem::take(&mut self.protection),
            queues: std::mem::take(&mut self.queue_stack),
        }
    }

    /// Restores protection saved by [`Self::suspend`].
    pub fn resume(&mut self, snapshot: ProtectionSnapshot) {
        self.protection = snapshot.protection;
        self.queue_stack = snapshot.queues;
    }

    /// Records that `state` was accessed under `queue`.
    ///
    /// Returns the previously recorded identity when it differs; the first
    /// recording wins so a conflict is reported against a stable baseline.
    pub fn record_queue_usage(&mut self, state: &str, queue: &str) -> Option<String> {
        match self.queue_usage.get(state) {
            Some(existing) if existing != queue => Some(existing.clone()),
            Some(_) => None,
            None => {
                self.queue_usage.insert(state.to_string(), queue.to_string());
                None
            }
        }
    }
}
