//! Swift source lowering via tree-sitter.
//!
//! [`SwiftParser`] turns raw source text into the [`crate::syntax`] tree
//! the engine consumes. Lowering is tolerant by construction: node kinds
//! it does not model are flattened into their constituent expressions in
//! source order, and a file tree-sitter cannot make sense of simply
//! yields an empty [`SourceFile`] (and therefore zero violations).

use tree_sitter::{Language, Node, Parser};

use crate::syntax::{
    Access, Argument, CallExpr, ClosureExpr, Expr, FunctionDecl, PropertyDecl, SourceFile, Span,
    TypeDecl, TypeKind,
};

/// Trait for language-specific source lowering.
///
/// The engine itself is parser-agnostic; implement this to feed it from
/// another frontend.
pub trait LanguageParser: Send + Sync {
    /// Language identifier (e.g., `"swift"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this parser handles (e.g., `&[".swift"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses source text into the engine's syntax tree.
    fn parse(&self, source: &str) -> SourceFile;
}

/// Lowers Swift sources using Tree-sitter.
pub struct SwiftParser {
    language: Language,
}

impl SwiftParser {
    /// Creates a new Swift parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_swift::LANGUAGE.into(),
        }
    }
}

impl Default for SwiftParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for SwiftParser {
    fn language_id(&self) -> &'static str {
        "swift"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".swift"]
    }

    fn parse(&self, source: &str) -> SourceFile {
        let mut parser = Parser::new();
        if parser.set_language(&self.language).is_err() {
            tracing::warn!("failed to load the Swift grammar");
            return SourceFile::default();
        }
        let src = source.as_bytes();
        let Some(tree) = parser.parse(src, None) else {
            return SourceFile::default();
        };

        let mut file = SourceFile::default();
        collect_top_level(&tree.root_node(), src, &mut file);
        file
    }
}

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn span_of(node: &Node<'_>) -> Span {
    let start = node.start_position();
    Span {
        line: start.row + 1,
        column: start.column + 1,
        offset: node.start_byte(),
        length: node.end_byte().saturating_sub(node.start_byte()),
    }
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn all_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn find_child<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    all_children(node).into_iter().find(|c| c.kind() == kind)
}

fn find_descendant<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    for child in named_children(node) {
        if child.kind() == kind {
            return Some(child);
        }
        if let Some(found) = find_descendant(&child, kind) {
            return Some(found);
        }
    }
    None
}

fn collect_top_level(node: &Node<'_>, src: &[u8], file: &mut SourceFile) {
    for child in named_children(node) {
        match child.kind() {
            "class_declaration" | "protocol_declaration" => {
                file.types.push(lower_type(&child, src));
            }
            "function_declaration" => {
                let function = lower_function(&child, src);
                if !function.name.is_empty() {
                    file.functions.push(function);
                }
            }
            _ => collect_top_level(&child, src, file),
        }
    }
}

// ── declarations ──

fn lower_type(node: &Node<'_>, src: &[u8]) -> TypeDecl {
    let kind = type_kind(node);
    let name = find_child(node, "type_identifier")
        .or_else(|| find_child(node, "user_type"))
        .map_or_else(String::new, |n| text(&n, src).to_owned());

    let mut ty = TypeDecl::new(name, kind, span_of(node));

    for child in all_children(node) {
        match child.kind() {
            "inheritance_specifier" => {
                ty.inherits.push(text(&child, src).trim().to_owned());
            }
            "attribute" => {
                ty.attributes
                    .push(text(&child, src).trim_start_matches('@').to_owned());
            }
            "modifiers" => {
                for inner in all_children(&child) {
                    if inner.kind() == "attribute" {
                        ty.attributes
                            .push(text(&inner, src).trim_start_matches('@').to_owned());
                    }
                }
            }
            k if k.ends_with("_body") => lower_type_body(&child, src, &mut ty),
            _ => {}
        }
    }

    ty
}

fn type_kind(node: &Node<'_>) -> TypeKind {
    if node.kind() == "protocol_declaration" {
        return TypeKind::Protocol;
    }
    for child in all_children(node) {
        match child.kind() {
            "struct" => return TypeKind::Struct,
            "enum" => return TypeKind::Enum,
            "actor" => return TypeKind::Actor,
            "extension" => return TypeKind::Extension,
            "class" => return TypeKind::Class,
            _ => {}
        }
    }
    TypeKind::Class
}

fn lower_type_body(body: &Node<'_>, src: &[u8], ty: &mut TypeDecl) {
    for child in named_children(body) {
        match child.kind() {
            "property_declaration" => {
                let property = lower_property(&child, src);
                if !property.name.is_empty() {
                    ty.properties.push(property);
                }
            }
            "function_declaration" => {
                let function = lower_function(&child, src);
                if !function.name.is_empty() {
                    ty.functions.push(function);
                }
            }
            "class_declaration" | "protocol_declaration" => {
                ty.types.push(lower_type(&child, src));
            }
            _ => {}
        }
    }
}

fn modifier_words(node: &Node<'_>, src: &[u8]) -> Vec<String> {
    find_child(node, "modifiers").map_or_else(Vec::new, |m| {
        text(&m, src)
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect()
    })
}

fn access_from(words: &[String]) -> Access {
    for word in words {
        if word == "private" || word.starts_with("private(") {
            return Access::Private;
        }
        if word == "fileprivate" || word.starts_with("fileprivate(") {
            return Access::Fileprivate;
        }
        if word == "public" {
            return Access::Public;
        }
        if word == "open" {
            return Access::Open;
        }
    }
    Access::Internal
}

/// Depth-limited keyword scan; `var`/`let` may sit directly under the
/// declaration or inside a binding-pattern node.
fn has_keyword(node: &Node<'_>, keyword: &str, depth: usize) -> bool {
    for child in all_children(node) {
        if child.kind() == keyword {
            return true;
        }
        if depth > 0 && has_keyword(&child, keyword, depth - 1) {
            return true;
        }
    }
    false
}

fn lower_property(node: &Node<'_>, src: &[u8]) -> PropertyDecl {
    let words = modifier_words(node, src);
    let computed = find_child(node, "computed_property").is_some();

    let name_node = find_descendant(node, "simple_identifier");
    let (name, span) = name_node.map_or_else(
        || (String::new(), span_of(node)),
        |n| (text(&n, src).to_owned(), span_of(&n)),
    );

    let type_name = find_child(node, "type_annotation")
        .map(|t| text(&t, src).trim_start_matches(':').trim().to_owned());

    // Initializer is whatever follows the `=` sign.
    let mut initializer = None;
    let mut seen_eq = false;
    for child in all_children(node) {
        if child.kind() == "=" {
            seen_eq = true;
            continue;
        }
        if seen_eq && child.is_named() {
            if let Some(expr) = lower_expr(&child, src) {
                initializer = Some(expr);
                break;
            }
        }
    }

    PropertyDecl {
        name,
        span,
        mutable: !computed && has_keyword(node, "var", 1),
        is_static: words.iter().any(|w| w == "static"),
        access: access_from(&words),
        type_name,
        initializer,
    }
}

fn lower_function(node: &Node<'_>, src: &[u8]) -> FunctionDecl {
    let words = modifier_words(node, src);
    let name_node = find_child(node, "simple_identifier");
    let (name, span) = name_node.map_or_else(
        || (String::new(), span_of(node)),
        |n| (text(&n, src).to_owned(), span_of(&n)),
    );

    let body = find_child(node, "function_body")
        .map_or_else(Vec::new, |b| lower_block(&b, src));

    FunctionDecl {
        name,
        span,
        access: access_from(&words),
        is_static: words.iter().any(|w| w == "static"),
        body,
    }
}

// ── expressions ──

fn lower_block(node: &Node<'_>, src: &[u8]) -> Vec<Expr> {
    match find_child(node, "statements") {
        Some(statements) => named_children(&statements)
            .iter()
            .flat_map(|c| lower_expr_list(c, src))
            .collect(),
        None => named_children(node)
            .iter()
            .flat_map(|c| lower_expr_list(c, src))
            .collect(),
    }
}

/// Lowers a node into the expressions it contains, in source order.
///
/// Known expression kinds produce a single node; local declarations keep
/// their initializer; nested type and function declarations are opaque;
/// anything else flattens into its children.
fn lower_expr_list(node: &Node<'_>, src: &[u8]) -> Vec<Expr> {
    if let Some(expr) = lower_expr(node, src) {
        return vec![expr];
    }
    match node.kind() {
        "property_declaration" => lower_property(node, src)
            .initializer
            .map_or_else(Vec::new, |e| vec![e]),
        "class_declaration" | "protocol_declaration" | "function_declaration" => Vec::new(),
        _ => named_children(node)
            .iter()
            .flat_map(|c| lower_expr_list(c, src))
            .collect(),
    }
}

fn lower_expr(node: &Node<'_>, src: &[u8]) -> Option<Expr> {
    match node.kind() {
        "simple_identifier" => Some(Expr::ident(text(node, src), span_of(node))),
        "self_expression" => Some(Expr::SelfRef(span_of(node))),
        "navigation_expression" => lower_navigation(node, src),
        "call_expression" => lower_call(node, src),
        "constructor_expression" => lower_constructor(node, src),
        "lambda_literal" => Some(Expr::Closure(lower_closure(node, src))),
        "assignment" => lower_assignment(node, src),
        "line_string_literal" | "multi_line_string_literal" | "raw_string_literal" => {
            Some(Expr::string(string_value(node, src), span_of(node)))
        }
        _ => None,
    }
}

fn lower_navigation(node: &Node<'_>, src: &[u8]) -> Option<Expr> {
    let children = named_children(node);
    let base_node = children.first()?;
    let suffix = find_child(node, "navigation_suffix")?;
    let member = find_child(&suffix, "simple_identifier")?;

    let base = lower_expr(base_node, src)
        .unwrap_or_else(|| Expr::ident(text(base_node, src), span_of(base_node)));
    Some(Expr::member(base, text(&member, src), span_of(&member)))
}

fn lower_call(node: &Node<'_>, src: &[u8]) -> Option<Expr> {
    let suffix = find_child(node, "call_suffix")?;
    let callee_node = named_children(node)
        .into_iter()
        .find(|c| c.kind() != "call_suffix")?;
    let callee = lower_expr(&callee_node, src)
        .unwrap_or_else(|| Expr::ident(text(&callee_node, src), span_of(&callee_node)));

    let (arguments, trailing_closure) = lower_call_suffix(&suffix, src);
    Some(Expr::Call(CallExpr {
        callee: Box::new(callee),
        arguments,
        trailing_closure,
        span: span_of(node),
    }))
}

/// `Type(...)` constructions surface as their own node kind; lower them
/// to a call on the type name so `DispatchQueue(label:)` and `Task { }`
/// are uniform with other calls.
fn lower_constructor(node: &Node<'_>, src: &[u8]) -> Option<Expr> {
    let ty = find_descendant(node, "type_identifier")?;
    let callee = Expr::ident(text(&ty, src), span_of(&ty));

    let (arguments, trailing_closure) = find_child(node, "constructor_suffix")
        .map_or_else(|| (Vec::new(), None), |s| lower_call_suffix(&s, src));

    Some(Expr::Call(CallExpr {
        callee: Box::new(callee),
        arguments,
        trailing_closure,
        span: span_of(node),
    }))
}

fn lower_call_suffix(suffix: &Node<'_>, src: &[u8]) -> (Vec<Argument>, Option<ClosureExpr>) {
    let mut arguments = Vec::new();
    let mut trailing = None;

    for child in named_children(suffix) {
        match child.kind() {
            "value_arguments" => {
                for argument in named_children(&child) {
                    if argument.kind() == "value_argument" {
                        arguments.push(lower_argument(&argument, src));
                    }
                }
            }
            "lambda_literal" => trailing = Some(lower_closure(&child, src)),
            _ => {}
        }
    }

    (arguments, trailing)
}

fn lower_argument(node: &Node<'_>, src: &[u8]) -> Argument {
    let children = all_children(node);
    let colon = children.iter().position(|c| c.kind() == ":");

    let label = colon.and_then(|at| {
        children[..at]
            .iter()
            .rev()
            .find(|c| c.is_named())
            .map(|c| text(c, src).to_owned())
    });

    let value = children
        .iter()
        .skip(colon.map_or(0, |at| at + 1))
        .filter(|c| c.is_named())
        .find_map(|c| lower_expr(c, src))
        .unwrap_or_else(|| Expr::string(text(node, src), span_of(node)));

    Argument { label, value }
}

fn lower_closure(node: &Node<'_>, src: &[u8]) -> ClosureExpr {
    ClosureExpr {
        body: lower_block(node, src),
        span: span_of(node),
    }
}

fn lower_assignment(node: &Node<'_>, src: &[u8]) -> Option<Expr> {
    let target_node = find_child(node, "directly_assignable_expression")
        .and_then(|d| named_children(&d).into_iter().next())
        .or_else(|| named_children(node).into_iter().next())?;
    let target = lower_expr(&target_node, src)
        .unwrap_or_else(|| Expr::ident(text(&target_node, src), span_of(&target_node)));

    let value = named_children(node)
        .iter()
        .rev()
        .find(|c| c.start_byte() > target_node.end_byte())
        .map_or_else(
            || Expr::string("", span_of(node)),
            |v| lower_expr(v, src).unwrap_or_else(|| Expr::string(text(v, src), span_of(v))),
        );

    Some(Expr::assign(target, value, span_of(node)))
}

fn string_value(node: &Node<'_>, src: &[u8]) -> String {
    let mut parts = Vec::new();
    collect_string_parts(node, src, &mut parts);
    if parts.is_empty() {
        text(node, src).trim_matches('"').to_owned()
    } else {
        parts.concat()
    }
}

fn collect_string_parts(node: &Node<'_>, src: &[u8], parts: &mut Vec<String>) {
    for child in named_children(node) {
        if child.kind().ends_with("str_text") {
            parts.push(text(&child, src).to_owned());
        } else {
            collect_string_parts(&child, src, parts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::is_queue_construction;

    fn parse(source: &str) -> SourceFile {
        SwiftParser::new().parse(source)
    }

    #[test]
    fn empty_source() {
        let file = parse("");
        assert!(file.types.is_empty());
        assert!(file.functions.is_empty());
    }

    #[test]
    fn extracts_class_with_conformance() {
        let file = parse("class Counter: ThreadSafe {\n}\n");
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].name, "Counter");
        assert_eq!(file.types[0].kind, TypeKind::Class);
        assert!(file.types[0].inherits.iter().any(|i| i == "ThreadSafe"));
    }

    #[test]
    fn extracts_struct_kind() {
        let file = parse("struct Point {\n}\n");
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].kind, TypeKind::Struct);
    }

    #[test]
    fn extracts_private_var_property() {
        let file = parse(
            "class Counter: ThreadSafe {\n    private var count = 0\n}\n",
        );
        let ty = &file.types[0];
        assert_eq!(ty.properties.len(), 1);
        let property = &ty.properties[0];
        assert_eq!(property.name, "count");
        assert!(property.mutable);
        assert_eq!(property.access, Access::Private);
        assert_eq!(property.span.line, 2);
    }

    #[test]
    fn let_property_is_immutable() {
        let file = parse("class Counter: ThreadSafe {\n    let limit = 10\n}\n");
        assert!(!file.types[0].properties[0].mutable);
    }

    #[test]
    fn queue_property_initializer_is_a_construction() {
        let file = parse(
            "class Cache: ThreadSafe {\n    private let queue = DispatchQueue(label: \"com.example.cache\")\n}\n",
        );
        let property = &file.types[0].properties[0];
        assert_eq!(property.name, "queue");
        match &property.initializer {
            Some(Expr::Call(call)) => {
                assert!(is_queue_construction(call));
                assert_eq!(call.string_argument("label"), Some("com.example.cache"));
            }
            other => panic!("expected construction initializer, got {other:?}"),
        }
    }

    #[test]
    fn extracts_member_function_with_wrapper_call() {
        let file = parse(
            "class Cache: ThreadSafe {\n    func update() {\n        queue.sync { _count = 1 }\n    }\n}\n",
        );
        let ty = &file.types[0];
        assert_eq!(ty.functions.len(), 1);
        let function = &ty.functions[0];
        assert_eq!(function.name, "update");
        assert_eq!(function.body.len(), 1);

        let Expr::Call(call) = &function.body[0] else {
            panic!("expected call, got {:?}", function.body[0]);
        };
        assert_eq!(call.target_name(), Some("sync"));
        assert!(matches!(call.receiver(), Some(Expr::Identifier(i)) if i.name == "queue"));
        let closure = call.trailing_closure.as_ref().unwrap_or_else(|| {
            panic!("expected trailing closure");
        });
        assert!(!closure.body.is_empty());
    }

    #[test]
    fn free_functions_are_collected() {
        let file = parse("func helper() {\n}\n");
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].name, "helper");
    }

    #[test]
    fn unparseable_text_yields_best_effort_or_nothing() {
        // Garbage input must not panic; findings are best-effort.
        let _ = parse("@@@ ??? {{{");
    }
}
