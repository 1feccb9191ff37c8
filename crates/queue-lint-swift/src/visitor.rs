//! Per-type rule visitor.
//!
//! One visitor instance walks one eligible type: declaration rules first,
//! then wrapper auto-detection, then every member function body. All
//! traversal state lives in the owned [`TypeContext`], so sibling types
//! are analyzed independently.

use std::path::Path;

use queue_lint_core::{QueueLintConfig, Violation};

use crate::classify::{
    self, is_guarded_name, CallResolution, ClosureClassifier, ClosureRole, QueueTarget,
};
use crate::context::TypeContext;
use crate::engine::FileIndex;
use crate::rules;
use crate::syntax::{Access, CallExpr, ClosureExpr, Expr, FunctionDecl, PropertyDecl, TypeDecl};

/// Walks one type declaration and collects violations.
pub(crate) struct TypeVisitor<'a> {
    config: &'a QueueLintConfig,
    file: &'a Path,
    index: &'a FileIndex,
    ty: &'a TypeDecl,
    classifier: ClosureClassifier,
    queue_properties: Vec<String>,
    ctx: TypeContext,
    violations: Vec<Violation>,
}

impl<'a> TypeVisitor<'a> {
    pub(crate) fn new(
        config: &'a QueueLintConfig,
        file: &'a Path,
        index: &'a FileIndex,
        ty: &'a TypeDecl,
    ) -> Self {
        Self {
            config,
            file,
            index,
            ty,
            classifier: classify::classify_closure,
            queue_properties: Vec::new(),
            ctx: TypeContext::new(),
            violations: Vec::new(),
        }
    }

    /// Runs all rules over the type and returns the collected violations.
    pub(crate) fn run(mut self) -> Vec<Violation> {
        let ty = self.ty;

        self.queue_properties = ty
            .properties
            .iter()
            .filter(|p| is_queue_property(p))
            .map(|p| p.name.clone())
            .collect();

        self.check_declarations(ty);
        self.detect_wrappers(ty);

        for function in &ty.functions {
            self.visit_function(function);
        }

        self.violations
    }

    // ── declaration rules ──

    fn check_declarations(&mut self, ty: &TypeDecl) {
        let mut first_queue: Option<&PropertyDecl> = None;
        for property in &ty.properties {
            if is_queue_property(property) {
                if let Some(first) = first_queue {
                    self.violations.push(rules::second_queue_property(
                        self.file,
                        property.span,
                        &ty.name,
                        &property.name,
                        &first.name,
                    ));
                } else {
                    first_queue = Some(property);
                }
            }

            if property.mutable && !property.is_static && !is_guarded_name(&property.name) {
                self.violations
                    .push(rules::missing_prefix(self.file, property.span, &property.name));
            }

            if is_guarded_name(&property.name) && property.access != Access::Private {
                self.violations
                    .push(rules::not_private(self.file, property.span, &property.name));
            }
        }

        for function in &ty.functions {
            if is_guarded_name(&function.name) && function.access != Access::Private {
                self.violations
                    .push(rules::not_private(self.file, function.span, &function.name));
            }
        }
    }

    // ── wrapper auto-detection ──

    /// Scans unprefixed member functions for a dispatch through a
    /// configured wrapper method; a hit marks the function itself as a
    /// wrapper for this type, remembering the underlying queue identity.
    fn detect_wrappers(&mut self, ty: &TypeDecl) {
        for function in &ty.functions {
            if is_guarded_name(&function.name) {
                continue;
            }
            if let Some(identity) = self.find_wrapper_dispatch(&function.body) {
                self.ctx
                    .detected_wrappers
                    .insert(function.name.clone(), identity);
            }
        }
    }

    fn find_wrapper_dispatch(&self, body: &[Expr]) -> Option<Option<String>> {
        body.iter().find_map(|e| self.find_dispatch_in(e))
    }

    fn find_dispatch_in(&self, expr: &Expr) -> Option<Option<String>> {
        match expr {
            Expr::Call(call) => {
                if let Some(target) = call.target_name() {
                    if self.config.is_wrapper_method(target) {
                        let queue =
                            classify::classify_queue_target(call.receiver(), &self.queue_properties);
                        return Some(queue.identity());
                    }
                }
                self.find_dispatch_in(&call.callee)
                    .or_else(|| {
                        call.arguments
                            .iter()
                            .find_map(|a| self.find_dispatch_in(&a.value))
                    })
                    .or_else(|| {
                        call.trailing_closure
                            .as_ref()
                            .and_then(|c| self.find_wrapper_dispatch(&c.body))
                    })
            }
            Expr::Member(m) => self.find_dispatch_in(&m.base),
            Expr::Assign(a) => self
                .find_dispatch_in(&a.target)
                .or_else(|| self.find_dispatch_in(&a.value)),
            Expr::Closure(c) => self.find_wrapper_dispatch(&c.body),
            _ => None,
        }
    }

    fn is_wrapper(&self, name: &str) -> bool {
        self.config.is_wrapper_method(name) || self.ctx.detected_wrappers.contains_key(name)
    }

    // ── traversal ──

    fn visit_function(&mut self, function: &FunctionDecl) {
        self.ctx.enter_function(&function.name);
        for expr in &function.body {
            self.visit_expr(expr);
        }
        self.ctx.exit_function();
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier(id) => self.check_reference(&id.name, expr),
            Expr::SelfRef(_) | Expr::StringLit(_) => {}
            Expr::Member(m) => {
                // `self._x` is this object's guarded state; `other._x` is
                // another object's and is counted at its own base.
                if is_guarded_name(&m.member) && matches!(m.base.as_ref(), Expr::SelfRef(_)) {
                    self.check_reference(&m.member, expr);
                }
                self.visit_expr(&m.base);
            }
            Expr::Assign(a) => {
                self.visit_expr(&a.target);
                self.visit_expr(&a.value);
            }
            Expr::Closure(c) => {
                // A closure outside call position: timing unknown.
                self.visit_suspended(c);
            }
            Expr::Call(c) => self.visit_call(c),
        }
    }

    fn visit_call(&mut self, call: &CallExpr) {
        let target = call.target_name().map(ToString::to_string);
        let is_wrapper = target.as_deref().is_some_and(|t| self.is_wrapper(t));
        let queue_target = classify::classify_queue_target(call.receiver(), &self.queue_properties);
        let is_construction = classify::is_queue_construction(call);

        if self.ctx.in_guarded_function {
            self.check_guarded_call_site(call, target.as_deref(), is_wrapper, &queue_target);
        } else if is_construction {
            self.violations.push(rules::inline_queue(self.file, call.span));
        }

        // Receiver chain and plain arguments evaluate in the current context.
        self.visit_expr(&call.callee);
        for argument in &call.arguments {
            match &argument.value {
                Expr::Closure(closure) => {
                    self.visit_closure(target.as_deref(), is_wrapper, false, closure, &queue_target);
                }
                other => self.visit_expr(other),
            }
        }
        if let Some(closure) = &call.trailing_closure {
            self.visit_closure(target.as_deref(), is_wrapper, true, closure, &queue_target);
        }
    }

    fn visit_closure(
        &mut self,
        target: Option<&str>,
        is_wrapper: bool,
        is_trailing: bool,
        closure: &ClosureExpr,
        queue_target: &QueueTarget,
    ) {
        match (self.classifier)(target, is_wrapper, is_trailing) {
            ClosureRole::WrapperBody => {
                let identity = self.wrapper_identity(target, queue_target);
                self.ctx.enter_protected(identity);
                for expr in &closure.body {
                    self.visit_expr(expr);
                }
                self.ctx.exit_protected();
            }
            ClosureRole::EscapingDispatch | ClosureRole::OpaqueCallback => {
                self.visit_suspended(closure);
            }
        }
    }

    fn visit_suspended(&mut self, closure: &ClosureExpr) {
        let snapshot = self.ctx.suspend();
        for expr in &closure.body {
            self.visit_expr(expr);
        }
        self.ctx.resume(snapshot);
    }

    /// Queue identity protecting a wrapper call's trailing block.
    fn wrapper_identity(&self, target: Option<&str>, queue_target: &QueueTarget) -> String {
        if let Some(identity) = queue_target.identity() {
            return identity;
        }
        // Receiverless: a detected wrapper protects via its underlying
        // queue; fall back to the wrapper's own name.
        target
            .and_then(|t| self.ctx.detected_wrappers.get(t).cloned().flatten())
            .or_else(|| target.map(ToString::to_string))
            .unwrap_or_else(|| "queue".to_string())
    }

    // ── access rule (QL001) and queue consistency (QL006, QL007) ──

    fn check_reference(&mut self, name: &str, expr: &Expr) {
        if !is_guarded_name(name) || self.ctx.in_guarded_function {
            return;
        }

        if self.ctx.is_protected() {
            let Some(queue) = self.ctx.current_queue().map(ToString::to_string) else {
                return;
            };
            if classify::is_shared_identity(&queue) {
                self.violations.push(rules::shared_queue_access(
                    self.file,
                    expr.span(),
                    name,
                    &queue,
                ));
            }
            if let Some(first) = self.ctx.record_queue_usage(name, &queue) {
                self.violations.push(rules::multiple_queues(
                    self.file,
                    expr.span(),
                    name,
                    &first,
                    &queue,
                ));
            }
        } else {
            let function = self
                .ctx
                .current_function
                .clone()
                .unwrap_or_else(|| "init".to_string());
            self.violations
                .push(rules::unguarded_access(self.file, expr.span(), &function, name));
        }
    }

    // ── guarded-function rules (QL004, QL005) ──

    fn check_guarded_call_site(
        &mut self,
        call: &CallExpr,
        target: Option<&str>,
        is_wrapper: bool,
        queue_target: &QueueTarget,
    ) {
        let function = self
            .ctx
            .current_function
            .clone()
            .unwrap_or_else(|| "init".to_string());

        if classify::is_queue_construction(call) {
            self.violations
                .push(rules::queue_op_in_guarded(self.file, call.span, &function));
            return;
        }

        if is_wrapper {
            // Dispatching to a clearly unrelated queue hands off work; a
            // freshly constructed queue was already flagged at its own
            // call site. Everything else re-enters the serialization point.
            match queue_target {
                QueueTarget::OwnProperty(_)
                | QueueTarget::SharedMain
                | QueueTarget::SharedGlobal
                | QueueTarget::Unqualified => {
                    self.violations
                        .push(rules::queue_op_in_guarded(self.file, call.span, &function));
                }
                QueueTarget::External(_) | QueueTarget::Inline(_) => {}
            }
            return;
        }

        if queue_target.is_shared() {
            self.violations
                .push(rules::queue_op_in_guarded(self.file, call.span, &function));
            return;
        }

        // Call-graph rule: only bare and self-qualified calls resolve;
        // calls on other receivers are outside same-file reasoning.
        let receiver_is_self = match call.receiver() {
            None => true,
            Some(Expr::SelfRef(_)) => true,
            Some(_) => false,
        };
        if !receiver_is_self {
            return;
        }

        let Some(name) = target else { return };
        match classify::resolve_call(name, self.config, self.index) {
            CallResolution::SameFileSafe => {}
            CallResolution::SameFileUnsafe => {
                self.violations
                    .push(rules::unguarded_call(self.file, call.span, &function, name));
            }
            CallResolution::Unresolved => {
                if self.config.warn_unresolved_calls {
                    self.violations
                        .push(rules::unresolved_call(self.file, call.span, &function, name));
                }
            }
        }
    }
}

/// Returns whether a property stores the queue primitive.
fn is_queue_property(property: &PropertyDecl) -> bool {
    let annotated = property
        .type_name
        .as_deref()
        .map(|t| t.trim_end_matches(['?', '!']))
        .is_some_and(|t| t == classify::QUEUE_TYPE);
    let constructed = matches!(
        &property.initializer,
        Some(Expr::Call(call)) if classify::is_queue_construction(call)
    );
    annotated || constructed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FileIndex;
    use crate::syntax::{Argument, SourceFile, Span, TypeKind};

    fn s(line: usize) -> Span {
        Span::line(line)
    }

    fn eligible_class(name: &str) -> TypeDecl {
        let mut ty = TypeDecl::new(name, TypeKind::Class, s(1));
        ty.inherits.push("ThreadSafe".to_string());
        ty
    }

    fn queue_property(name: &str, line: usize) -> PropertyDecl {
        PropertyDecl {
            name: name.to_string(),
            span: s(line),
            mutable: false,
            is_static: false,
            access: Access::Private,
            type_name: Some("DispatchQueue".to_string()),
            initializer: None,
        }
    }

    fn state_property(name: &str, line: usize) -> PropertyDecl {
        PropertyDecl {
            name: name.to_string(),
            span: s(line),
            mutable: true,
            is_static: false,
            access: Access::Private,
            type_name: None,
            initializer: None,
        }
    }

    fn function(name: &str, access: Access, line: usize, body: Vec<Expr>) -> FunctionDecl {
        FunctionDecl::new(name, access, s(line)).with_body(body)
    }

    /// `queue.sync { body }` style wrapper call.
    fn wrapper_call(receiver: &str, method: &str, line: usize, body: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            callee: Box::new(Expr::member(Expr::ident(receiver, s(line)), method, s(line))),
            arguments: Vec::new(),
            trailing_closure: Some(ClosureExpr { body, span: s(line) }),
            span: s(line),
        })
    }

    /// `name { body }` style receiverless call with trailing closure.
    fn bare_trailing_call(name: &str, line: usize, body: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            callee: Box::new(Expr::ident(name, s(line))),
            arguments: Vec::new(),
            trailing_closure: Some(ClosureExpr { body, span: s(line) }),
            span: s(line),
        })
    }

    fn bare_call(name: &str, line: usize) -> Expr {
        Expr::call(Expr::ident(name, s(line)), s(line))
    }

    fn assign(name: &str, line: usize) -> Expr {
        Expr::assign(
            Expr::ident(name, s(line)),
            Expr::string("value", s(line)),
            s(line),
        )
    }

    fn analyze(ty: TypeDecl) -> Vec<Violation> {
        analyze_with(ty, &QueueLintConfig::default())
    }

    fn analyze_with(ty: TypeDecl, config: &QueueLintConfig) -> Vec<Violation> {
        let file = SourceFile {
            types: vec![ty],
            functions: Vec::new(),
        };
        let index = FileIndex::build(&file);
        TypeVisitor::new(config, Path::new("Test.swift"), &index, &file.types[0]).run()
    }

    fn count(violations: &[Violation], code: &str) -> usize {
        violations.iter().filter(|v| v.code == code).count()
    }

    // ── scenario A ──

    #[test]
    fn unprefixed_mutable_member_is_flagged_once() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(state_property("data", 2));

        let violations = analyze(ty);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "QL002");
        assert!(violations[0].message.contains("data"));
        assert!(violations[0]
            .message
            .contains("must use underscore-style prefix for thread safety"));
    }

    #[test]
    fn static_and_immutable_members_are_exempt() {
        let mut ty = eligible_class("Cache");
        let mut shared = state_property("shared", 2);
        shared.is_static = true;
        ty.properties.push(shared);

        let mut constant = state_property("limit", 3);
        constant.mutable = false;
        ty.properties.push(constant);

        assert!(analyze(ty).is_empty());
    }

    // ── scenario B ──

    #[test]
    fn wrapper_protected_access_is_clean() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        ty.functions.push(function(
            "update",
            Access::Public,
            4,
            vec![wrapper_call("queue", "sync", 5, vec![assign("_x", 5)])],
        ));

        assert!(analyze(ty).is_empty());
    }

    // ── scenario C ──

    #[test]
    fn direct_access_outside_protection_is_flagged() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        ty.functions
            .push(function("update", Access::Public, 4, vec![assign("_x", 5)]));

        let violations = analyze(ty);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "QL001");
        assert!(violations[0].message.contains("_x"));
        assert!(violations[0].message.contains("'update'"));
        assert!(violations[0].message.contains("Use queue protection."));
    }

    #[test]
    fn self_qualified_access_counts_as_guarded_state() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(state_property("_x", 2));
        ty.functions.push(function(
            "update",
            Access::Public,
            3,
            vec![Expr::assign(
                Expr::self_member("_x", s(4)),
                Expr::string("v", s(4)),
                s(4),
            )],
        ));

        assert_eq!(count(&analyze(ty), "QL001"), 1);
    }

    #[test]
    fn other_objects_state_is_not_flagged_here() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "peek",
            Access::Public,
            2,
            vec![Expr::member(Expr::ident("other", s(3)), "_x", s(3))],
        ));

        assert!(analyze(ty).is_empty());
    }

    #[test]
    fn guarded_receiver_of_member_call_is_flagged() {
        // `_items.append(1)` outside protection: `_items` is the receiver.
        let mut ty = eligible_class("Cache");
        ty.properties.push(state_property("_items", 2));
        ty.functions.push(function(
            "add",
            Access::Public,
            3,
            vec![Expr::call(
                Expr::member(Expr::ident("_items", s(4)), "append", s(4)),
                s(4),
            )],
        ));

        let violations = analyze(ty);
        assert_eq!(count(&violations, "QL001"), 1);
        assert!(violations[0].message.contains("_items"));
    }

    // ── scenario D ──

    #[test]
    fn wrapper_call_inside_guarded_function_is_flagged_once() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.functions.push(function(
            "_flush",
            Access::Private,
            3,
            vec![wrapper_call("queue", "sync", 4, vec![assign("_x", 4)])],
        ));

        let violations = analyze(ty);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "QL005");
        assert!(violations[0].message.contains("deadlock"));
    }

    #[test]
    fn queue_construction_inside_guarded_function_is_flagged() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "_rebuild",
            Access::Private,
            2,
            vec![Expr::call(Expr::ident("DispatchQueue", s(3)), s(3))],
        ));

        let violations = analyze(ty);
        assert_eq!(count(&violations, "QL005"), 1);
    }

    #[test]
    fn dispatch_to_external_queue_is_exempt_in_guarded_function() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.functions.push(function(
            "_notify",
            Access::Private,
            3,
            vec![wrapper_call(
                "responseQueue",
                "async",
                4,
                vec![bare_call("completion", 4)],
            )],
        ));

        assert!(analyze(ty).is_empty());
    }

    #[test]
    fn shared_queue_call_inside_guarded_function_is_flagged() {
        let mut ty = eligible_class("Cache");
        let main_async = Expr::Call(CallExpr {
            callee: Box::new(Expr::member(
                Expr::member(Expr::ident("DispatchQueue", s(3)), "main", s(3)),
                "async",
                s(3),
            )),
            arguments: Vec::new(),
            trailing_closure: Some(ClosureExpr {
                body: vec![bare_call("completion", 3)],
                span: s(3),
            }),
            span: s(3),
        });
        ty.functions
            .push(function("_publish", Access::Private, 2, vec![main_async]));

        assert_eq!(count(&analyze(ty), "QL005"), 1);
    }

    // ── scenario E ──

    #[test]
    fn state_protected_by_two_queues_is_flagged_once() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("q1", 2));
        ty.properties.push(queue_property("q2", 3));
        ty.properties.push(state_property("_x", 4));
        ty.functions.push(function(
            "first",
            Access::Public,
            5,
            vec![wrapper_call("q1", "sync", 6, vec![assign("_x", 6)])],
        ));
        ty.functions.push(function(
            "second",
            Access::Public,
            7,
            vec![wrapper_call("q2", "sync", 8, vec![assign("_x", 8)])],
        ));

        let violations = analyze(ty);
        let conflicts: Vec<_> = violations.iter().filter(|v| v.code == "QL006").collect();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("q1"));
        assert!(conflicts[0].message.contains("q2"));
        assert!(conflicts[0].message.contains("Use a single queue."));
        // The second queue property itself is a declaration finding.
        assert_eq!(count(&violations, "QL007"), 1);
    }

    #[test]
    fn consistent_queue_usage_is_clean() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        for (name, line) in [("first", 4), ("second", 6)] {
            ty.functions.push(function(
                name,
                Access::Public,
                line,
                vec![wrapper_call("queue", "sync", line + 1, vec![assign("_x", line + 1)])],
            ));
        }

        assert!(analyze(ty).is_empty());
    }

    // ── scenario F ──

    #[test]
    fn guarded_function_calling_guarded_function_is_clean() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "_flush",
            Access::Private,
            2,
            vec![bare_call("_persist", 3)],
        ));
        ty.functions
            .push(function("_persist", Access::Private, 5, Vec::new()));

        assert!(analyze(ty).is_empty());
    }

    #[test]
    fn guarded_function_calling_unguarded_same_file_function_is_flagged() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "_flush",
            Access::Private,
            2,
            vec![bare_call("persist", 3)],
        ));
        ty.functions
            .push(function("persist", Access::Internal, 5, Vec::new()));

        let violations = analyze(ty);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "QL004");
        assert!(violations[0].message.contains("'persist'"));
        assert!(violations[0].message.contains("deadlocks"));
    }

    #[test]
    fn allowlisted_and_callback_calls_are_safe_from_guarded_functions() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "_flush",
            Access::Private,
            2,
            vec![
                bare_call("removeAll", 3),
                bare_call("print", 4),
                bare_call("completion", 5),
                bare_call("successHandler", 6),
            ],
        ));

        assert!(analyze(ty).is_empty());
    }

    #[test]
    fn unresolved_call_is_silent_by_default_and_warns_when_configured() {
        let build = || {
            let mut ty = eligible_class("Cache");
            ty.functions.push(function(
                "_flush",
                Access::Private,
                2,
                vec![bare_call("persistToDisk", 3)],
            ));
            ty
        };

        assert!(analyze(build()).is_empty());

        let mut config = QueueLintConfig::default();
        config.warn_unresolved_calls = true;
        let violations = analyze_with(build(), &config);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, queue_lint_core::Severity::Warning);
        assert!(violations[0].message.contains("persistToDisk"));
    }

    // ── underscore privacy ──

    #[test]
    fn underscore_members_must_be_private() {
        let mut ty = eligible_class("Cache");
        let mut state = state_property("_x", 2);
        state.access = Access::Internal;
        ty.properties.push(state);
        ty.functions
            .push(function("_flush", Access::Public, 3, Vec::new()));

        let violations = analyze(ty);
        assert_eq!(count(&violations, "QL003"), 2);
        assert!(violations
            .iter()
            .all(|v| v.code != "QL003" || v.message.contains("must be private")));
    }

    // ── closure roles ──

    #[test]
    fn escaping_closure_resets_protection_and_restores_it() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        ty.properties.push(state_property("_y", 4));
        ty.functions.push(function(
            "update",
            Access::Public,
            5,
            vec![wrapper_call(
                "queue",
                "sync",
                6,
                vec![
                    bare_trailing_call("Task", 7, vec![assign("_x", 7)]),
                    assign("_y", 8),
                ],
            )],
        ));

        let violations = analyze(ty);
        // The Task body lost protection; the access after it kept it.
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "QL001");
        assert!(violations[0].message.contains("_x"));
    }

    #[test]
    fn opaque_iteration_block_resets_protection() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        ty.functions.push(function(
            "update",
            Access::Public,
            4,
            vec![wrapper_call(
                "queue",
                "sync",
                5,
                vec![Expr::Call(CallExpr {
                    callee: Box::new(Expr::member(Expr::ident("items", s(6)), "forEach", s(6))),
                    arguments: Vec::new(),
                    trailing_closure: Some(ClosureExpr {
                        body: vec![assign("_x", 6)],
                        span: s(6),
                    }),
                    span: s(6),
                })],
            )],
        ));

        assert_eq!(count(&analyze(ty), "QL001"), 1);
    }

    #[test]
    fn closure_in_argument_position_does_not_inherit_protection() {
        // `queue.sync(execute: { _x = 1 })`: only the trailing block form
        // is recognized as the wrapper body.
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        ty.functions.push(function(
            "update",
            Access::Public,
            4,
            vec![Expr::Call(CallExpr {
                callee: Box::new(Expr::member(Expr::ident("queue", s(5)), "sync", s(5))),
                arguments: vec![Argument {
                    label: Some("execute".to_string()),
                    value: Expr::Closure(ClosureExpr {
                        body: vec![assign("_x", 5)],
                        span: s(5),
                    }),
                }],
                trailing_closure: None,
                span: s(5),
            })],
        ));

        assert_eq!(count(&analyze(ty), "QL001"), 1);
    }

    // ── wrapper auto-detection ──

    #[test]
    fn detected_wrapper_grants_protection_under_the_underlying_queue() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.properties.push(state_property("_x", 3));
        // withLock dispatches through queue.sync, so it is a wrapper.
        ty.functions.push(function(
            "withLock",
            Access::Public,
            4,
            vec![wrapper_call("queue", "sync", 5, vec![bare_call("body", 5)])],
        ));
        ty.functions.push(function(
            "update",
            Access::Public,
            7,
            vec![bare_trailing_call("withLock", 8, vec![assign("_x", 8)])],
        ));
        // Direct dispatch elsewhere must agree on the queue identity.
        ty.functions.push(function(
            "reset",
            Access::Public,
            10,
            vec![wrapper_call("queue", "sync", 11, vec![assign("_x", 11)])],
        ));

        assert!(analyze(ty).is_empty());
    }

    #[test]
    fn detected_wrapper_over_different_queue_conflicts() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("q1", 2));
        ty.properties.push(queue_property("q2", 3));
        ty.properties.push(state_property("_x", 4));
        ty.functions.push(function(
            "withLock",
            Access::Public,
            5,
            vec![wrapper_call("q2", "sync", 6, vec![bare_call("body", 6)])],
        ));
        ty.functions.push(function(
            "first",
            Access::Public,
            8,
            vec![wrapper_call("q1", "sync", 9, vec![assign("_x", 9)])],
        ));
        ty.functions.push(function(
            "second",
            Access::Public,
            11,
            vec![bare_trailing_call("withLock", 12, vec![assign("_x", 12)])],
        ));

        let violations = analyze(ty);
        let conflicts: Vec<_> = violations.iter().filter(|v| v.code == "QL006").collect();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("q1"));
        assert!(conflicts[0].message.contains("q2"));
    }

    #[test]
    fn calling_a_detected_wrapper_from_guarded_function_is_flagged() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(queue_property("queue", 2));
        ty.functions.push(function(
            "withLock",
            Access::Public,
            3,
            vec![wrapper_call("queue", "sync", 4, vec![bare_call("body", 4)])],
        ));
        ty.functions.push(function(
            "_flush",
            Access::Private,
            6,
            vec![bare_trailing_call("withLock", 7, vec![assign("_x", 7)])],
        ));

        assert_eq!(count(&analyze(ty), "QL005"), 1);
    }

    // ── queue declarations ──

    #[test]
    fn inline_queue_construction_in_body_is_flagged() {
        let mut ty = eligible_class("Cache");
        ty.functions.push(function(
            "rebuild",
            Access::Public,
            2,
            vec![Expr::Call(CallExpr {
                callee: Box::new(Expr::ident("DispatchQueue", s(3))),
                arguments: vec![Argument {
                    label: Some("label".to_string()),
                    value: Expr::string("com.example.tmp", s(3)),
                }],
                trailing_closure: None,
                span: s(3),
            })],
        ));

        let violations = analyze(ty);
        assert_eq!(count(&violations, "QL007"), 1);
        assert!(violations[0].message.contains("inline"));
    }

    #[test]
    fn shared_queue_protection_is_flagged_at_the_access() {
        let mut ty = eligible_class("Cache");
        ty.properties.push(state_property("_x", 2));
        let main_async = Expr::Call(CallExpr {
            callee: Box::new(Expr::member(
                Expr::member(Expr::ident("DispatchQueue", s(4)), "main", s(4)),
                "async",
                s(4),
            )),
            arguments: Vec::new(),
            trailing_closure: Some(ClosureExpr {
                body: vec![assign("_x", 4)],
                span: s(4),
            }),
            span: s(4),
        });
        ty.functions
            .push(function("publish", Access::Public, 3, vec![main_async]));

        let violations = analyze(ty);
        assert_eq!(count(&violations, "QL007"), 1);
        assert!(violations[0].message.contains("DispatchQueue.main"));
    }
}
