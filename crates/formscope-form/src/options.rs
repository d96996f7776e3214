//! Option extraction from option configuration methods.
//!
//! Scans `configureOptions` (and its predecessor `setDefaultOptions`) for
//! options-resolver setter calls and reports every option they declare to a
//! visitor. `parent::configureOptions()` pulls in the parent class's options
//! under the same form class tag.

use crate::context::AnalysisContext;
use formscope_parser::literals::{array_key_entries, array_values_with_nodes, literal_value};
use formscope_types::{Call, Callee, Expr, ExprKind, FormClassRef, FormOption, OptionKind, PhpClass};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::sync::Arc;

/// Where an option was declared.
#[derive(Debug, Clone, Copy)]
pub struct OptionSource<'a> {
    /// File of the declaring class.
    pub uri: &'a str,
    /// The option name literal.
    pub key: &'a Expr,
    /// Default value expression (`Default` emissions only).
    pub value: Option<&'a Expr>,
}

/// Sink for discovered options.
pub trait FormOptionVisitor {
    fn visit(
        &mut self,
        source: OptionSource<'_>,
        option: &str,
        form_class: &FormClassRef,
        kind: OptionKind,
    );
}

impl<F> FormOptionVisitor for F
where
    F: FnMut(OptionSource<'_>, &str, &FormClassRef, OptionKind),
{
    fn visit(
        &mut self,
        source: OptionSource<'_>,
        option: &str,
        form_class: &FormClassRef,
        kind: OptionKind,
    ) {
        self(source, option, form_class, kind)
    }
}

/// Collects emissions into a name → option map.
///
/// The first emission of a name inserts it. Later emissions add their kind
/// and move the declaring class to the latest emitter, so a modifier is
/// never hidden even when several classes declare the same option.
#[derive(Debug, Clone, Default)]
pub struct FormOptionMap {
    options: IndexMap<String, FormOption>,
}

impl FormOptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, option: &str) -> Option<&FormOption> {
        self.options.get(option)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn into_options(self) -> IndexMap<String, FormOption> {
        self.options
    }
}

impl FormOptionVisitor for FormOptionMap {
    fn visit(
        &mut self,
        source: OptionSource<'_>,
        option: &str,
        form_class: &FormClassRef,
        kind: OptionKind,
    ) {
        let default_value = match kind {
            OptionKind::Default => source.value.and_then(literal_value),
            _ => None,
        };

        match self.options.entry(option.to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.add_kind(kind);
                existing.form_class = form_class.clone();
                if default_value.is_some() {
                    existing.default_value = default_value;
                }
            }
            Entry::Vacant(entry) => {
                let mut created = FormOption::new(option, form_class.clone(), kind);
                created.default_value = default_value;
                entry.insert(created);
            }
        }
    }
}

/// Report every option `class` declares in its option configuration
/// methods, tagged with `form_class`.
pub fn visit_class_options(
    ctx: &AnalysisContext<'_>,
    class: &Arc<PhpClass>,
    form_class: &FormClassRef,
    visitor: &mut dyn FormOptionVisitor,
) {
    visit_class_options_at(ctx, class, form_class, visitor, 0);
}

fn visit_class_options_at(
    ctx: &AnalysisContext<'_>,
    class: &Arc<PhpClass>,
    form_class: &FormClassRef,
    visitor: &mut dyn FormOptionVisitor,
    depth: usize,
) {
    for method_name in &ctx.config.option_methods {
        let Some(owner) = ctx.method_owner(class, method_name) else {
            continue;
        };
        let Some(body) = owner.own_method(method_name).and_then(|m| m.body.as_ref()) else {
            continue;
        };

        for call in body.calls() {
            visit_setter_call(call, &owner.uri, form_class, visitor);

            if call.is_parent_call() && call.is_named(method_name) {
                let Some(parent) = ctx.parent_class(&owner) else {
                    continue;
                };
                if depth >= ctx.config.max_depth {
                    tracing::debug!(
                        "parent::{} chain of {} cut at depth {}",
                        method_name,
                        class.fqn,
                        depth
                    );
                    continue;
                }
                visit_class_options_at(ctx, &parent, form_class, visitor, depth + 1);
            }
        }
    }
}

fn visit_setter_call(
    call: &Call,
    uri: &str,
    form_class: &FormClassRef,
    visitor: &mut dyn FormOptionVisitor,
) {
    if !matches!(call.callee, Callee::Method(_)) {
        return;
    }
    let Some(argument) = call.first_argument() else {
        return;
    };

    // ->setDefault('name', $value)
    if call.is_named("setDefault") {
        if let Some(name) = argument.as_str().filter(|n| !n.trim().is_empty()) {
            let source = OptionSource {
                uri,
                key: argument,
                value: call.arguments.get(1),
            };
            emit(visitor, source, name, form_class, OptionKind::Default);
        }
        return;
    }

    let Some(kind) = OptionKind::from_setter(&call.name) else {
        return;
    };

    match kind {
        // ->setDefaults(['name' => $value])
        OptionKind::Default => {
            for (name, entry) in array_key_entries(argument) {
                let source = OptionSource {
                    uri,
                    key: entry.key_node,
                    value: entry.value,
                };
                emit(visitor, source, &name, form_class, kind);
            }
        }
        // ->setRequired(['name']) or ->setRequired('name')
        _ => {
            if let ExprKind::String(name) = &argument.kind {
                if !name.trim().is_empty() {
                    let source = OptionSource {
                        uri,
                        key: argument,
                        value: None,
                    };
                    emit(visitor, source, name, form_class, kind);
                }
                return;
            }
            for (name, node) in array_values_with_nodes(argument) {
                let source = OptionSource {
                    uri,
                    key: node,
                    value: None,
                };
                emit(visitor, source, &name, form_class, kind);
            }
        }
    }
}

fn emit(
    visitor: &mut dyn FormOptionVisitor,
    source: OptionSource<'_>,
    option: &str,
    form_class: &FormClassRef,
    kind: OptionKind,
) {
    tracing::trace!("option {} ({}) from {}", option, kind, form_class.fqn());
    visitor.visit(source, option, form_class, kind);
}

/// Options of a single class, merged by name.
pub fn class_options(
    ctx: &AnalysisContext<'_>,
    class: &Arc<PhpClass>,
    form_class: &FormClassRef,
) -> IndexMap<String, FormOption> {
    let mut map = FormOptionMap::new();
    visit_class_options(ctx, class, form_class, &mut map);
    map.into_options()
}
