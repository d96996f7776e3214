//! Lower tree-sitter PHP nodes into the shared expression tree.
//!
//! Only the node kinds the form analyses look at get a dedicated variant.
//! Everything else becomes `ExprKind::Other` with its named children
//! lowered, so calls nested in statements, closures or conditions are still
//! found by traversal.

use crate::names::{node_text, NameContext};
use formscope_types::{ArrayElement, Call, Callee, Expr, ExprKind, Range};
use tree_sitter::Node;

/// Lower a CST node (statement or expression) into an `Expr`.
pub fn lower(node: Node, source: &str, names: &NameContext) -> Expr {
    let range = node_range(node);
    if node.is_missing() {
        return Expr::missing(range);
    }

    let kind = match node.kind() {
        "string" => ExprKind::String(decode_single_quoted(node_text(node, source))),
        "encapsed_string" => match decode_double_quoted(node, source) {
            Some(value) => ExprKind::String(value),
            None => ExprKind::Other(lower_named_children(node, source, names)),
        },
        "integer" | "float" | "boolean" | "null" => {
            ExprKind::Scalar(node_text(node, source).to_string())
        }
        "array_creation_expression" => ExprKind::Array(lower_array(node, source, names)),
        "conditional_expression" => {
            let condition = node
                .child_by_field_name("condition")
                .map(|n| lower(n, source, names));
            let body = node
                .child_by_field_name("body")
                .map(|n| lower(n, source, names));
            let otherwise = node
                .child_by_field_name("alternative")
                .map(|n| Box::new(lower(n, source, names)));
            // `a ?: b` yields `a` when it is truthy
            let then = body.or_else(|| condition.clone()).map(Box::new);
            ExprKind::Ternary {
                condition: condition.map(Box::new),
                then,
                otherwise,
            }
        }
        "binary_expression" => lower_binary(node, source, names),
        "parenthesized_expression" => {
            return first_named_child(node)
                .map(|inner| lower(inner, source, names))
                .unwrap_or_else(|| Expr::missing(range));
        }
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let object = lower_field(node, "object", source, names);
            ExprKind::Call(Call {
                callee: Callee::Method(Box::new(object)),
                name: field_text(node, "name", source),
                arguments: lower_arguments(node, source, names),
            })
        }
        "scoped_call_expression" => {
            let scope = node
                .child_by_field_name("scope")
                .map(|s| scope_name(s, source, names))
                .unwrap_or_default();
            ExprKind::Call(Call {
                callee: Callee::Static(scope),
                name: field_text(node, "name", source),
                arguments: lower_arguments(node, source, names),
            })
        }
        "function_call_expression" => ExprKind::Call(Call {
            callee: Callee::Function,
            name: field_text(node, "function", source)
                .trim_start_matches('\\')
                .to_string(),
            arguments: lower_arguments(node, source, names),
        }),
        "member_access_expression" | "nullsafe_member_access_expression" => {
            ExprKind::PropertyFetch {
                object: Box::new(lower_field(node, "object", source, names)),
                property: field_text(node, "name", source),
            }
        }
        "subscript_expression" => {
            let mut cursor = node.walk();
            let mut children = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment");
            let object = children
                .next()
                .map(|n| lower(n, source, names))
                .unwrap_or_else(|| Expr::missing(range));
            let index = children.next().map(|n| Box::new(lower(n, source, names)));
            ExprKind::Subscript {
                object: Box::new(object),
                index,
            }
        }
        "assignment_expression"
        | "augmented_assignment_expression"
        | "reference_assignment_expression" => ExprKind::Assign {
            target: Box::new(lower_field(node, "left", source, names)),
            value: Box::new(lower_field(node, "right", source, names)),
        },
        "class_constant_access_expression" => {
            let mut cursor = node.walk();
            let parts: Vec<Node> = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment")
                .collect();
            match (parts.first(), parts.last()) {
                (Some(scope), Some(constant)) if parts.len() >= 2 => ExprKind::ClassConstant {
                    class: scope_name(*scope, source, names),
                    constant: node_text(*constant, source).to_string(),
                },
                _ => ExprKind::Other(lower_named_children(node, source, names)),
            }
        }
        "variable_name" => {
            ExprKind::Variable(node_text(node, source).trim_start_matches('$').to_string())
        }
        "name" | "qualified_name" => ExprKind::Name(node_text(node, source).to_string()),
        "return_statement" => ExprKind::Return(
            first_named_child(node).map(|n| Box::new(lower(n, source, names))),
        ),
        "yield_expression" => {
            let value = first_named_child(node).map(|n| {
                if n.kind() == "array_element_initializer" {
                    // `yield $key => $value`
                    let element = lower_array_element(n, source, names);
                    element.value.unwrap_or_else(|| Expr::missing(node_range(n)))
                } else {
                    lower(n, source, names)
                }
            });
            ExprKind::Yield(value.map(Box::new))
        }
        _ => ExprKind::Other(lower_named_children(node, source, names)),
    };

    Expr::new(kind, range)
}

fn lower_named_children(node: Node, source: &str, names: &NameContext) -> Vec<Expr> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .map(|c| lower(c, source, names))
        .collect()
}

fn lower_field(node: Node, field: &str, source: &str, names: &NameContext) -> Expr {
    match node.child_by_field_name(field) {
        Some(child) => lower(child, source, names),
        None => Expr::missing(node_range(node)),
    }
}

fn field_text(node: Node, field: &str, source: &str) -> String {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default()
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    first
}

/// Scope of a static call or class constant: relative scopes verbatim,
/// class names resolved.
fn scope_name(node: Node, source: &str, names: &NameContext) -> String {
    match node.kind() {
        "relative_scope" => node_text(node, source).to_ascii_lowercase(),
        "name" | "qualified_name" => names.resolve_class_name(node_text(node, source)),
        _ => node_text(node, source).to_string(),
    }
}

/// Arguments of a call; named arguments keep only their value.
fn lower_arguments(node: Node, source: &str, names: &NameContext) -> Vec<Expr> {
    let Some(arguments) = node.child_by_field_name("arguments") else {
        return Vec::new();
    };

    let mut result = Vec::new();
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        if argument.kind() != "argument" {
            continue;
        }
        let mut arg_cursor = argument.walk();
        let value = argument
            .named_children(&mut arg_cursor)
            .filter(|c| c.kind() != "comment")
            .last();
        match value {
            Some(value) => result.push(lower(value, source, names)),
            None => result.push(Expr::missing(node_range(argument))),
        }
    }
    result
}

/// Elements of an array literal. Empty slots and error nodes become
/// elements without a value so the surrounding elements survive.
fn lower_array(node: Node, source: &str, names: &NameContext) -> Vec<ArrayElement> {
    let mut elements = Vec::new();
    // Whether the previous significant child opened a slot (`[`, `(` or `,`)
    let mut slot_open = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "[" | "(" => slot_open = true,
            "," => {
                if slot_open {
                    elements.push(empty_element(child));
                }
                slot_open = true;
            }
            "array_element_initializer" => {
                elements.push(lower_array_element(child, source, names));
                slot_open = false;
            }
            "ERROR" => {
                elements.push(empty_element(child));
                slot_open = false;
            }
            _ => {}
        }
    }
    elements
}

fn empty_element(node: Node) -> ArrayElement {
    ArrayElement {
        key: None,
        value: None,
        range: node_range(node),
    }
}

fn lower_array_element(node: Node, source: &str, names: &NameContext) -> ArrayElement {
    let mut key: Option<Expr> = None;
    let mut value: Option<Expr> = None;
    let mut saw_arrow = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "=>" {
            saw_arrow = true;
            // What we took for the value was the key
            key = value.take();
            continue;
        }
        if !child.is_named() || child.kind() == "comment" {
            continue;
        }
        if value.is_none() {
            value = Some(lower(child, source, names));
        }
    }

    if saw_arrow && key.is_none() {
        key = Some(Expr::missing(node_range(node)));
    }

    ArrayElement {
        key,
        value,
        range: node_range(node),
    }
}

fn lower_binary(node: Node, source: &str, names: &NameContext) -> ExprKind {
    let left = node.child_by_field_name("left");
    let right = node.child_by_field_name("right");
    let operator = node.child_by_field_name("operator").map(|o| o.kind());

    if operator != Some(".") {
        let mut parts = Vec::new();
        parts.extend(left.map(|n| lower(n, source, names)));
        parts.extend(right.map(|n| lower(n, source, names)));
        return ExprKind::Other(parts);
    }

    let mut parts = Vec::new();
    for operand in [left, right] {
        match operand {
            // `'a' . 'b' . 'c'` nests to the left; flatten it
            Some(n) if n.kind() == "binary_expression" => {
                let lowered = lower(n, source, names);
                match lowered.kind {
                    ExprKind::Concat(inner) => parts.extend(inner),
                    _ => parts.push(lowered),
                }
            }
            Some(n) => parts.push(lower(n, source, names)),
            None => parts.push(Expr::missing(node_range(node))),
        }
    }
    ExprKind::Concat(parts)
}

/// Decode a single-quoted PHP string: only `\\` and `\'` are escapes.
fn decode_single_quoted(raw: &str) -> String {
    let raw = raw.strip_prefix(['b', 'B']).unwrap_or(raw);
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Decode a double-quoted PHP string. Strings with interpolation are not
/// literals and yield `None`.
fn decode_double_quoted(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let interpolated = node.named_children(&mut cursor).any(|c| {
        !matches!(
            c.kind(),
            "string_content" | "string_value" | "escape_sequence"
        )
    });
    if interpolated {
        return None;
    }

    let raw = node_text(node, source);
    let raw = raw.strip_prefix(['b', 'B']).unwrap_or(raw);
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('v') => out.push('\u{0B}'),
            Some('f') => out.push('\u{0C}'),
            Some('e') => out.push('\u{1B}'),
            Some(c @ ('\\' | '$' | '"')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

pub(crate) fn node_range(node: Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    (
        start.row as u32,
        start.column as u32,
        end.row as u32,
        end.column as u32,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::FileParser;

    /// Lower the right-hand side of `$x = <expression>;`.
    pub(crate) fn lower_expression(expression: &str) -> Expr {
        let code = format!("<?php\n$x = {};\n", expression);
        let mut parser = FileParser::new();
        parser.parse_full(&code);
        let tree = parser.tree().unwrap();
        let program = lower(tree.root_node(), &code, &NameContext::default());
        program
            .descendants()
            .into_iter()
            .find_map(|e| match &e.kind {
                ExprKind::Assign { value, .. } => Some(value.as_ref().clone()),
                _ => None,
            })
            .expect("assignment")
    }

    #[test]
    fn test_lower_strings() {
        assert_eq!(lower_expression("'foo'").as_str(), Some("foo"));
        assert_eq!(lower_expression("\"foo\"").as_str(), Some("foo"));
        assert_eq!(lower_expression("'it\\'s'").as_str(), Some("it's"));
        assert_eq!(lower_expression("''").as_str(), Some(""));
        assert_eq!(lower_expression("\"a\\tb\"").as_str(), Some("a\tb"));
    }

    #[test]
    fn test_interpolated_string_is_not_literal() {
        let expr = lower_expression("\"foo $bar\"");
        assert!(expr.as_str().is_none());
    }

    #[test]
    fn test_lower_array_with_keys() {
        let expr = lower_expression("['a' => 1, 'b']");
        let ExprKind::Array(elements) = &expr.kind else {
            panic!("expected array, got {:?}", expr.kind);
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].key.as_ref().and_then(Expr::as_str), Some("a"));
        assert!(matches!(
            elements[0].value.as_ref().map(|v| &v.kind),
            Some(ExprKind::Scalar(s)) if s == "1"
        ));
        assert!(elements[1].key.is_none());
        assert_eq!(elements[1].value.as_ref().and_then(Expr::as_str), Some("b"));
    }

    #[test]
    fn test_lower_long_array_syntax() {
        let expr = lower_expression("array('x', 'y')");
        let ExprKind::Array(elements) = &expr.kind else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_lower_concat_is_flattened() {
        let expr = lower_expression("'a' . 'b' . 'c'");
        let ExprKind::Concat(parts) = &expr.kind else {
            panic!("expected concat");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_lower_ternary_and_elvis() {
        let expr = lower_expression("$a ? 'x' : 'y'");
        let ExprKind::Ternary { then, otherwise, .. } = &expr.kind else {
            panic!("expected ternary");
        };
        assert_eq!(then.as_deref().and_then(Expr::as_str), Some("x"));
        assert_eq!(otherwise.as_deref().and_then(Expr::as_str), Some("y"));

        let elvis = lower_expression("'x' ?: 'y'");
        let ExprKind::Ternary { then, .. } = &elvis.kind else {
            panic!("expected ternary");
        };
        assert_eq!(then.as_deref().and_then(Expr::as_str), Some("x"));
    }

    #[test]
    fn test_lower_method_call() {
        let expr = lower_expression("$resolver->setDefaults(['a' => 1])");
        let call = expr.as_call().expect("call");
        assert_eq!(call.name, "setDefaults");
        assert!(matches!(&call.callee, Callee::Method(o) if matches!(&o.kind, ExprKind::Variable(v) if v == "resolver")));
        assert_eq!(call.arguments.len(), 1);
        assert!(matches!(call.arguments[0].kind, ExprKind::Array(_)));
    }

    #[test]
    fn test_lower_parent_call() {
        let expr = lower_expression("parent::configureOptions($resolver)");
        let call = expr.as_call().expect("call");
        assert!(call.is_parent_call());
        assert_eq!(call.name, "configureOptions");
    }

    #[test]
    fn test_lower_class_constant() {
        let expr = lower_expression("\\App\\Form\\FooType::class");
        assert_eq!(
            expr.kind,
            ExprKind::ClassConstant {
                class: "App\\Form\\FooType".into(),
                constant: "class".into()
            }
        );
    }

    #[test]
    fn test_lower_vars_subscript() {
        let expr = lower_expression("$view->vars['help']");
        let ExprKind::Subscript { object, index } = &expr.kind else {
            panic!("expected subscript");
        };
        assert!(object.is_property_fetch("vars"));
        assert_eq!(index.as_deref().and_then(Expr::as_str), Some("help"));
    }
}
