//! Position-annotated syntax tree for analyzed Swift sources.
//!
//! This is the language-level intermediate representation the rule engine
//! walks. It is produced by [`crate::parser::SwiftParser`] but deliberately
//! independent of tree-sitter, so engine behavior can be exercised against
//! hand-built trees.
//!
//! The model is intentionally partial: it keeps exactly the shapes the
//! rules reason about (declarations, calls, member accesses, closures,
//! assignments) and flattens everything else into its constituent
//! expressions in source order.

/// Byte/line position of a node in its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
    /// Length of the node in bytes.
    pub length: usize,
}

impl Span {
    /// Creates a span with only a line position, for hand-built trees.
    #[must_use]
    pub fn line(line: usize) -> Self {
        Self {
            line,
            column: 1,
            offset: 0,
            length: 0,
        }
    }
}

/// Swift access level of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// `private`
    Private,
    /// `fileprivate`
    Fileprivate,
    /// No modifier.
    #[default]
    Internal,
    /// `public`
    Public,
    /// `open`
    Open,
}

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// `class Foo`
    Class,
    /// `struct Foo`
    Struct,
    /// `enum Foo`
    Enum,
    /// `actor Foo`
    Actor,
    /// `protocol Foo`
    Protocol,
    /// `extension Foo`
    Extension,
}

/// A parsed source file: top-level types and free functions.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Top-level type declarations.
    pub types: Vec<TypeDecl>,
    /// Free functions (tracked for same-file call resolution).
    pub functions: Vec<FunctionDecl>,
}

/// A type declaration with its members.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Type name.
    pub name: String,
    /// Declaration kind.
    pub kind: TypeKind,
    /// Position of the declaration.
    pub span: Span,
    /// Inheritance clause entries (superclass and conformances).
    pub inherits: Vec<String>,
    /// Attributes, without the leading `@`.
    pub attributes: Vec<String>,
    /// Stored properties.
    pub properties: Vec<PropertyDecl>,
    /// Member functions.
    pub functions: Vec<FunctionDecl>,
    /// Nested type declarations.
    pub types: Vec<TypeDecl>,
}

impl TypeDecl {
    /// Creates an empty type declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            span,
            inherits: Vec::new(),
            attributes: Vec::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            types: Vec::new(),
        }
    }
}

/// A stored property declaration.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    /// Property name.
    pub name: String,
    /// Position of the name.
    pub span: Span,
    /// `var` (true) vs `let` (false).
    pub mutable: bool,
    /// `static` member.
    pub is_static: bool,
    /// Access level.
    pub access: Access,
    /// Declared type annotation, if present (e.g. `DispatchQueue`).
    pub type_name: Option<String>,
    /// Initializer expression, if present.
    pub initializer: Option<Expr>,
}

/// A function declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Function name.
    pub name: String,
    /// Position of the name.
    pub span: Span,
    /// Access level.
    pub access: Access,
    /// `static` member.
    pub is_static: bool,
    /// Body expressions in source order.
    pub body: Vec<Expr>,
}

impl FunctionDecl {
    /// Creates a function declaration with an empty body.
    #[must_use]
    pub fn new(name: impl Into<String>, access: Access, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            access,
            is_static: false,
            body: Vec::new(),
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<Expr>) -> Self {
        self.body = body;
        self
    }
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A bare identifier reference.
    Identifier(Identifier),
    /// The `self` reference.
    SelfRef(Span),
    /// A member access, e.g. `base.member`.
    Member(MemberAccess),
    /// A call expression (including constructions like `DispatchQueue(...)`).
    Call(CallExpr),
    /// A closure literal outside call position.
    Closure(ClosureExpr),
    /// An assignment, e.g. `_count = 0`.
    Assign(AssignExpr),
    /// A string literal (kept for queue label extraction).
    StringLit(StringLit),
}

/// A bare identifier.
#[derive(Debug, Clone)]
pub struct Identifier {
    /// Referenced name.
    pub name: String,
    /// Position.
    pub span: Span,
}

/// A member access expression.
#[derive(Debug, Clone)]
pub struct MemberAccess {
    /// Receiver expression.
    pub base: Box<Expr>,
    /// Accessed member name.
    pub member: String,
    /// Position of the member name.
    pub span: Span,
}

/// A labeled call argument.
#[derive(Debug, Clone)]
pub struct Argument {
    /// Argument label, if present.
    pub label: Option<String>,
    /// Argument value.
    pub value: Expr,
}

/// A call expression.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Called expression (identifier, member access, or nested call).
    pub callee: Box<Expr>,
    /// Parenthesized arguments.
    pub arguments: Vec<Argument>,
    /// Trailing closure, if present.
    pub trailing_closure: Option<ClosureExpr>,
    /// Position of the call.
    pub span: Span,
}

impl CallExpr {
    /// The name the call targets: the bare identifier or the final member.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expr::Identifier(id) => Some(&id.name),
            Expr::Member(m) => Some(&m.member),
            _ => None,
        }
    }

    /// The receiver the call is made on, if any.
    #[must_use]
    pub fn receiver(&self) -> Option<&Expr> {
        match self.callee.as_ref() {
            Expr::Member(m) => Some(m.base.as_ref()),
            _ => None,
        }
    }

    /// Looks up a labeled argument's string-literal value.
    #[must_use]
    pub fn string_argument(&self, label: &str) -> Option<&str> {
        self.arguments.iter().find_map(|a| {
            if a.label.as_deref() == Some(label) {
                match &a.value {
                    Expr::StringLit(s) => Some(s.value.as_str()),
                    _ => None,
                }
            } else {
                None
            }
        })
    }
}

/// A closure literal.
#[derive(Debug, Clone)]
pub struct ClosureExpr {
    /// Body expressions in source order.
    pub body: Vec<Expr>,
    /// Position.
    pub span: Span,
}

/// An assignment expression.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// Assignment target.
    pub target: Box<Expr>,
    /// Assigned value.
    pub value: Box<Expr>,
    /// Position.
    pub span: Span,
}

/// A string literal.
#[derive(Debug, Clone)]
pub struct StringLit {
    /// Literal contents without quotes.
    pub value: String,
    /// Position.
    pub span: Span,
}

impl Expr {
    /// Bare identifier expression.
    #[must_use]
    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::Identifier(Identifier {
            name: name.into(),
            span,
        })
    }

    /// Member access on an arbitrary base.
    #[must_use]
    pub fn member(base: Expr, member: impl Into<String>, span: Span) -> Self {
        Self::Member(MemberAccess {
            base: Box::new(base),
            member: member.into(),
            span,
        })
    }

    /// Member access on `self`.
    #[must_use]
    pub fn self_member(member: impl Into<String>, span: Span) -> Self {
        Self::member(Self::SelfRef(span), member, span)
    }

    /// Call with no arguments and no trailing closure.
    #[must_use]
    pub fn call(callee: Expr, span: Span) -> Self {
        Self::Call(CallExpr {
            callee: Box::new(callee),
            arguments: Vec::new(),
            trailing_closure: None,
            span,
        })
    }

    /// Assignment expression.
    #[must_use]
    pub fn assign(target: Expr, value: Expr, span: Span) -> Self {
        Self::Assign(AssignExpr {
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    /// String literal expression.
    #[must_use]
    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::StringLit(StringLit {
            value: value.into(),
            span,
        })
    }

    /// The span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Identifier(i) => i.span,
            Self::SelfRef(s) => *s,
            Self::Member(m) => m.span,
            Self::Call(c) => c.span,
            Self::Closure(c) => c.span,
            Self::Assign(a) => a.span,
            Self::StringLit(s) => s.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_target_name_for_bare_identifier() {
        let call = CallExpr {
            callee: Box::new(Expr::ident("flush", Span::line(1))),
            arguments: Vec::new(),
            trailing_closure: None,
            span: Span::line(1),
        };
        assert_eq!(call.target_name(), Some("flush"));
        assert!(call.receiver().is_none());
    }

    #[test]
    fn call_target_name_for_member_access() {
        let call = CallExpr {
            callee: Box::new(Expr::member(
                Expr::ident("queue", Span::line(3)),
                "sync",
                Span::line(3),
            )),
            arguments: Vec::new(),
            trailing_closure: None,
            span: Span::line(3),
        };
        assert_eq!(call.target_name(), Some("sync"));
        assert!(matches!(call.receiver(), Some(Expr::Identifier(i)) if i.name == "queue"));
    }

    #[test]
    fn string_argument_lookup() {
        let call = CallExpr {
            callee: Box::new(Expr::ident("DispatchQueue", Span::line(2))),
            arguments: vec![Argument {
                label: Some("label".to_string()),
                value: Expr::string("com.example.cache", Span::line(2)),
            }],
            trailing_closure: None,
            span: Span::line(2),
        };
        assert_eq!(call.string_argument("label"), Some("com.example.cache"));
        assert_eq!(call.string_argument("qos"), None);
    }
}
