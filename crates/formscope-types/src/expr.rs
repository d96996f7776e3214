//! Lowered expression tree.
//!
//! PHP method bodies and Twig tag expressions are both lowered into this
//! closed set of node kinds. Anything the analyses do not understand ends
//! up in `ExprKind::Other`, which keeps its children so nested calls and
//! assignments are still reachable by traversal.

use serde::{Deserialize, Serialize};

/// Line/column range: (start_line, start_col, end_line, end_col), 0-based.
pub type Range = (u32, u32, u32, u32);

/// A node of the lowered expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: Range,
}

/// Kind of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    /// String literal with its decoded contents.
    String(String),
    /// Number, boolean or null literal, kept as source text.
    Scalar(String),
    /// `array(...)` / `[...]` literal.
    Array(Vec<ArrayElement>),
    /// `cond ? a : b`. Every part may be missing in malformed source.
    Ternary {
        condition: Option<Box<Expr>>,
        then: Option<Box<Expr>>,
        otherwise: Option<Box<Expr>>,
    },
    /// String concatenation (`.` in PHP, `~` in Twig), flattened.
    Concat(Vec<Expr>),
    /// `Foo::BAR` / `Foo::class`; `class` holds the resolved name.
    ClassConstant { class: String, constant: String },
    /// `$name`, without the sigil.
    Variable(String),
    /// Bare identifier or qualified name.
    Name(String),
    /// `$object->property`
    PropertyFetch { object: Box<Expr>, property: String },
    /// `$object[index]`
    Subscript {
        object: Box<Expr>,
        index: Option<Box<Expr>>,
    },
    /// `target = value` (including compound assignments).
    Assign { target: Box<Expr>, value: Box<Expr> },
    Call(Call),
    Return(Option<Box<Expr>>),
    Yield(Option<Box<Expr>>),
    /// A child the syntax tree should have but does not.
    Missing,
    /// Unanalyzable construct.
    Other(Vec<Expr>),
}

/// One element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayElement {
    pub key: Option<Expr>,
    /// `None` for an empty slot (`['a', , 'b']`).
    pub value: Option<Expr>,
    pub range: Range,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Callee,
    pub name: String,
    pub arguments: Vec<Expr>,
}

/// What a call is made on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    /// `$object->name(...)`
    Method(Box<Expr>),
    /// `Scope::name(...)`; relative scopes (`parent`, `self`, `static`)
    /// are kept verbatim, class names are resolved.
    Static(String),
    /// `name(...)`
    Function,
}

impl Expr {
    pub fn new(kind: ExprKind, range: Range) -> Self {
        Expr { kind, range }
    }

    pub fn missing(range: Range) -> Self {
        Expr {
            kind: ExprKind::Missing,
            range,
        }
    }

    /// Contents of a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// `true` for `<anything>->{property}`.
    pub fn is_property_fetch(&self, property: &str) -> bool {
        matches!(&self.kind, ExprKind::PropertyFetch { property: p, .. } if p == property)
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        match &self.kind {
            ExprKind::Array(elements) => {
                for element in elements {
                    out.extend(element.key.as_ref());
                    out.extend(element.value.as_ref());
                }
            }
            ExprKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                out.extend(condition.as_deref());
                out.extend(then.as_deref());
                out.extend(otherwise.as_deref());
            }
            ExprKind::Concat(parts) | ExprKind::Other(parts) => out.extend(parts.iter()),
            ExprKind::PropertyFetch { object, .. } => out.push(object.as_ref()),
            ExprKind::Subscript { object, index } => {
                out.push(object.as_ref());
                out.extend(index.as_deref());
            }
            ExprKind::Assign { target, value } => {
                out.push(target.as_ref());
                out.push(value.as_ref());
            }
            ExprKind::Call(call) => {
                if let Callee::Method(object) = &call.callee {
                    out.push(object.as_ref());
                }
                out.extend(call.arguments.iter());
            }
            ExprKind::Return(value) | ExprKind::Yield(value) => out.extend(value.as_deref()),
            ExprKind::String(_)
            | ExprKind::Scalar(_)
            | ExprKind::ClassConstant { .. }
            | ExprKind::Variable(_)
            | ExprKind::Name(_)
            | ExprKind::Missing => {}
        }
        out
    }

    /// This node and all nodes below it, in pre-order.
    pub fn descendants(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// All calls at or below this node, in pre-order.
    pub fn calls(&self) -> Vec<&Call> {
        self.descendants()
            .into_iter()
            .filter_map(Expr::as_call)
            .collect()
    }
}

impl Call {
    /// PHP method and function names are case-insensitive.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `parent::name(...)`
    pub fn is_parent_call(&self) -> bool {
        matches!(&self.callee, Callee::Static(scope) if scope.eq_ignore_ascii_case("parent"))
    }

    pub fn first_argument(&self) -> Option<&Expr> {
        self.arguments.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: Range = (0, 0, 0, 0);

    fn string(s: &str) -> Expr {
        Expr::new(ExprKind::String(s.to_string()), R)
    }

    fn call(name: &str, arguments: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::Call(Call {
                callee: Callee::Method(Box::new(Expr::new(
                    ExprKind::Variable("resolver".into()),
                    R,
                ))),
                name: name.to_string(),
                arguments,
            }),
            R,
        )
    }

    #[test]
    fn test_descendants_pre_order() {
        let body = Expr::new(
            ExprKind::Other(vec![
                call("setDefaults", vec![string("a")]),
                call("setRequired", vec![string("b")]),
            ]),
            R,
        );
        let names: Vec<&str> = body.calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["setDefaults", "setRequired"]);

        let strings: Vec<&str> = body
            .descendants()
            .into_iter()
            .filter_map(Expr::as_str)
            .collect();
        assert_eq!(strings, vec!["a", "b"]);
    }

    #[test]
    fn test_call_name_is_case_insensitive() {
        let expr = call("SetDefaults", vec![]);
        assert!(expr.as_call().unwrap().is_named("setDefaults"));
        assert!(!expr.as_call().unwrap().is_parent_call());
    }

    #[test]
    fn test_parent_call() {
        let c = Call {
            callee: Callee::Static("parent".into()),
            name: "configureOptions".into(),
            arguments: vec![],
        };
        assert!(c.is_parent_call());
    }

    #[test]
    fn test_array_children_skip_empty_slots() {
        let array = Expr::new(
            ExprKind::Array(vec![
                ArrayElement {
                    key: None,
                    value: Some(string("a")),
                    range: R,
                },
                ArrayElement {
                    key: None,
                    value: None,
                    range: R,
                },
                ArrayElement {
                    key: Some(string("k")),
                    value: Some(string("v")),
                    range: R,
                },
            ]),
            R,
        );
        assert_eq!(array.children().len(), 3);
    }
}
