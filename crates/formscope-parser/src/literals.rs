//! Literal extractor.
//!
//! Recovers the compile-time string values an expression can evaluate to,
//! without evaluating anything. Unknown shapes contribute nothing: the
//! extractor never guesses.

use formscope_types::{Expr, ExprKind};
use indexmap::IndexSet;

/// Every string value `expr` may evaluate to.
///
/// * string literal: its contents (possibly empty; callers drop blanks)
/// * array literal: union over the values of elements without a key
/// * ternary: union of both branches, each judged on its own
/// * concatenation: the joined string when every operand is a literal
/// * anything else: nothing
pub fn extract_literals(expr: &Expr) -> IndexSet<String> {
    let mut out = IndexSet::new();
    collect_literals(expr, &mut out);
    out
}

fn collect_literals(expr: &Expr, out: &mut IndexSet<String>) {
    match &expr.kind {
        ExprKind::String(value) => {
            out.insert(value.clone());
        }
        ExprKind::Array(elements) => {
            for element in elements.iter().filter(|e| e.key.is_none()) {
                if let Some(value) = &element.value {
                    collect_literals(value, out);
                }
            }
        }
        ExprKind::Ternary {
            then, otherwise, ..
        } => {
            for branch in [then, otherwise].into_iter().flatten() {
                collect_literals(branch, out);
            }
        }
        ExprKind::Concat(_) => {
            if let Some(value) = constant_string(expr) {
                out.insert(value);
            }
        }
        _ => {}
    }
}

/// Single string value of a literal or an all-literal concatenation.
pub fn constant_string(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::String(value) => Some(value.clone()),
        ExprKind::Concat(parts) if !parts.is_empty() => parts
            .iter()
            .map(constant_string)
            .collect::<Option<Vec<_>>>()
            .map(|pieces| pieces.concat()),
        _ => None,
    }
}

/// Static value of an expression as text: strings, numbers, booleans and
/// null. Used for option default values.
pub fn literal_value(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Scalar(text) => Some(text.clone()),
        _ => constant_string(expr),
    }
}

/// Values of the keyless elements of an array literal, each paired with
/// the element node it came from. Blank values are dropped.
pub fn array_values_with_nodes(expr: &Expr) -> Vec<(String, &Expr)> {
    let ExprKind::Array(elements) = &expr.kind else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for element in elements.iter().filter(|e| e.key.is_none()) {
        let Some(value) = &element.value else {
            continue;
        };
        for literal in extract_literals(value) {
            if !literal.trim().is_empty() {
                out.push((literal, value));
            }
        }
    }
    out
}

/// A `'key' => value` entry of an array literal.
#[derive(Debug, Clone, Copy)]
pub struct KeyEntry<'a> {
    pub key_node: &'a Expr,
    pub value: Option<&'a Expr>,
}

/// String keys of an array literal paired with their nodes, in source
/// order. Non-literal and blank keys are skipped.
pub fn array_key_entries(expr: &Expr) -> Vec<(String, KeyEntry<'_>)> {
    let ExprKind::Array(elements) = &expr.kind else {
        return Vec::new();
    };

    elements
        .iter()
        .filter_map(|element| {
            let key_node = element.key.as_ref()?;
            let key = constant_string(key_node)?;
            if key.trim().is_empty() {
                return None;
            }
            Some((
                key,
                KeyEntry {
                    key_node,
                    value: element.value.as_ref(),
                },
            ))
        })
        .collect()
}

/// String keys of an array literal.
pub fn array_keys(expr: &Expr) -> Vec<String> {
    array_key_entries(expr)
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}
