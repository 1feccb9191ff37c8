//! Per-file rule engine.
//!
//! Walks one parsed source file, gates each type on the eligibility
//! marker, and dispatches a fresh [`TypeVisitor`] per eligible type.
//! The engine is purely functional per file: nothing survives a call to
//! [`QueueRuleEngine::analyze`] except the returned violations, so many
//! files can be analyzed in parallel with zero coordination.

use std::collections::HashSet;
use std::path::Path;

use queue_lint_core::{QueueLintConfig, Violation};

use crate::syntax::{SourceFile, TypeDecl, TypeKind};
use crate::visitor::TypeVisitor;

/// Conformance or attribute name opting a class into analysis.
pub const ELIGIBILITY_MARKER: &str = "ThreadSafe";

/// Same-file declaration index used for call-graph resolution.
///
/// Cross-file resolution is out of scope by design; a name missing here
/// is reported as unresolved, never silently treated as declared.
#[derive(Debug, Default)]
pub struct FileIndex {
    functions: HashSet<String>,
}

impl FileIndex {
    /// Indexes every function declared in the file: free functions plus
    /// member functions of all types, nested ones included.
    #[must_use]
    pub fn build(file: &SourceFile) -> Self {
        let mut functions = HashSet::new();
        for function in &file.functions {
            functions.insert(function.name.clone());
        }
        for ty in &file.types {
            Self::collect_type(ty, &mut functions);
        }
        Self { functions }
    }

    fn collect_type(ty: &TypeDecl, functions: &mut HashSet<String>) {
        for function in &ty.functions {
            functions.insert(function.name.clone());
        }
        for nested in &ty.types {
            Self::collect_type(nested, functions);
        }
    }

    /// Returns whether a function with this name is declared in the file.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }
}

/// Returns whether a type opts into the analysis.
///
/// Only reference types qualify: structs and enums are value types and
/// actors already isolate their state by construction.
#[must_use]
pub fn is_eligible(ty: &TypeDecl) -> bool {
    ty.kind == TypeKind::Class
        && (ty.inherits.iter().any(|i| i == ELIGIBILITY_MARKER)
            || ty.attributes.iter().any(|a| a == ELIGIBILITY_MARKER))
}

/// Applies the queue-confinement rules to parsed source files.
pub struct QueueRuleEngine {
    config: QueueLintConfig,
}

impl QueueRuleEngine {
    /// Create a new engine from config.
    #[must_use]
    pub fn new(config: QueueLintConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine runs with.
    #[must_use]
    pub fn config(&self) -> &QueueLintConfig {
        &self.config
    }

    /// Check a single parsed file for violations.
    ///
    /// The returned list is sorted by (line, column, code) so repeated
    /// runs over identical input produce identical output.
    #[must_use]
    pub fn analyze(&self, file: &SourceFile, path: &Path) -> Vec<Violation> {
        let index = FileIndex::build(file);
        let mut violations = Vec::new();

        for ty in &file.types {
            self.check_type(ty, path, &index, &mut violations);
        }

        violations.sort_by(|a, b| {
            a.location
                .line
                .cmp(&b.location.line)
                .then(a.location.column.cmp(&b.location.column))
                .then(a.code.cmp(&b.code))
        });
        violations
    }

    fn check_type(
        &self,
        ty: &TypeDecl,
        path: &Path,
        index: &FileIndex,
        out: &mut Vec<Violation>,
    ) {
        if !is_eligible(ty) {
            tracing::debug!("skipping ineligible type {}", ty.name);
            return;
        }

        out.extend(TypeVisitor::new(&self.config, path, index, ty).run());

        // Nested types are separate serialization domains: each gets its
        // own visitor and must carry its own marker.
        for nested in &ty.types {
            self.check_type(nested, path, index, out);
        }
    }
}
