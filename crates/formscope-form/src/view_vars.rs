//! View variables a form type exposes to templates.

use crate::context::AnalysisContext;
use crate::extensions::extension_options;
use formscope_parser::literals::array_keys;
use formscope_types::{Callee, Expr, ExprKind, PhpClass, PhpMethod};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

const VARS_PROPERTY: &str = "vars";

/// Keys written into `$view->vars` by the root form type and by every
/// extension declaring options for `form_type_names`.
pub fn collect_view_vars(ctx: &AnalysisContext<'_>, form_type_names: &[&str]) -> IndexSet<String> {
    let mut vars = IndexSet::new();
    for class in candidate_classes(ctx, form_type_names) {
        for method_name in &ctx.config.view_methods {
            let Some(owner) = ctx.method_owner(&class, method_name) else {
                continue;
            };
            let Some(method) = owner.own_method(method_name) else {
                continue;
            };
            method_vars(ctx, method, &mut vars);

            // one level of parent:: calls, not followed further
            for (parent_owner, name) in parent_call_targets(ctx, &owner, method) {
                if let Some(parent_method) = parent_owner.own_method(&name) {
                    method_vars(ctx, parent_method, &mut vars);
                }
            }
        }
    }
    vars
}

fn candidate_classes(ctx: &AnalysisContext<'_>, form_type_names: &[&str]) -> Vec<Arc<PhpClass>> {
    let mut classes: IndexMap<String, Arc<PhpClass>> = IndexMap::new();
    match ctx.class(&ctx.config.core_form_type) {
        Some(core) => {
            classes.insert(core.fqn.to_ascii_lowercase(), core);
        }
        None => tracing::debug!("core form type {} is not indexed", ctx.config.core_form_type),
    }
    for option in extension_options(ctx, form_type_names).into_values() {
        let class = option.form_class.class;
        classes.entry(class.fqn.to_ascii_lowercase()).or_insert(class);
    }
    classes.into_values().collect()
}

/// Declaring class and name of every method reached through a
/// `parent::name(...)` call inside `method` of `owner`.
fn parent_call_targets(
    ctx: &AnalysisContext<'_>,
    owner: &PhpClass,
    method: &PhpMethod,
) -> Vec<(Arc<PhpClass>, String)> {
    let Some(body) = &method.body else {
        return Vec::new();
    };
    let Some(parent) = ctx.parent_class(owner) else {
        return Vec::new();
    };
    body.calls()
        .into_iter()
        .filter(|call| call.is_parent_call())
        .filter_map(|call| {
            let target = ctx.method_owner(&parent, &call.name);
            if target.is_none() {
                tracing::debug!("parent::{} of {} does not resolve", call.name, owner.fqn);
            }
            target.map(|target| (target, call.name.clone()))
        })
        .collect()
}

fn method_vars(ctx: &AnalysisContext<'_>, method: &PhpMethod, vars: &mut IndexSet<String>) {
    let Some(body) = &method.body else {
        return;
    };
    for node in body.descendants() {
        match &node.kind {
            // $view->vars['key'] = ...
            ExprKind::Assign { target, .. } => vars.extend(written_key(target)),
            // array_replace($view->vars, ['key' => ...])
            ExprKind::Call(call)
                if matches!(call.callee, Callee::Function)
                    && ctx
                        .config
                        .view_merge_functions
                        .iter()
                        .any(|name| call.is_named(name))
                    && call.arguments.iter().any(|a| a.is_property_fetch(VARS_PROPERTY)) =>
            {
                if let Some(merged) = call
                    .arguments
                    .get(1)
                    .filter(|a| matches!(a.kind, ExprKind::Array(_)))
                {
                    vars.extend(array_keys(merged));
                }
            }
            _ => {}
        }
    }
}

/// The literal index written right below `->vars` in an assignment target,
/// e.g. `attr` for `$view->vars['attr']['class'] = ...`.
fn written_key(target: &Expr) -> Option<String> {
    let mut current = target;
    while let ExprKind::Subscript { object, index } = &current.kind {
        if object.is_property_fetch(VARS_PROPERTY) {
            return index
                .as_deref()
                .and_then(Expr::as_str)
                .filter(|key| !key.trim().is_empty())
                .map(str::to_string);
        }
        current = object;
    }
    None
}
