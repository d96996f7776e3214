//! Form type name resolution.
//!
//! A form type is referred to either by class name or by a short alias
//! (`"text"`, `"form"`). Aliases come from the built-in root type, service
//! registrations and the `getName()`/`getBlockPrefix()` literals of form
//! type classes.

use crate::context::{returned_values, AnalysisContext};
use formscope_parser::literals::extract_literals;
use formscope_types::{Expr, ExprKind, PhpClass};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Methods whose literal return value is a form type alias.
const ALIAS_METHODS: &[&str] = &["getName", "getBlockPrefix"];

/// Alias → class FQN table, built once per query.
#[derive(Debug, Clone, Default)]
pub struct FormTypeCollector {
    aliases: IndexMap<String, String>,
}

impl FormTypeCollector {
    pub fn collect(ctx: &AnalysisContext<'_>) -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert(
            ctx.config.core_form_alias.clone(),
            ctx.config.core_form_type.clone(),
        );

        for (alias, class) in ctx.services.form_type_aliases() {
            aliases.insert(alias, class);
        }

        for class in ctx.index.all_subclasses(&ctx.config.form_type_interface) {
            if !class.is_instantiable() {
                continue;
            }
            for method in ALIAS_METHODS {
                if let Some(alias) = own_literal(&class, method) {
                    aliases.entry(alias).or_insert_with(|| class.fqn.clone());
                }
            }
        }

        tracing::debug!("collected {} form type aliases", aliases.len());
        FormTypeCollector { aliases }
    }

    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    /// Aliases registered for the class `fqn`.
    pub fn aliases_of(&self, fqn: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, class)| class.trim_start_matches('\\').eq_ignore_ascii_case(fqn))
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// Resolve a type name: names containing `\` are class names, anything
    /// else is looked up as an alias first.
    pub fn resolve(&self, ctx: &AnalysisContext<'_>, name: &str) -> Option<Arc<PhpClass>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if name.contains('\\') {
            return ctx.class(name);
        }
        match self.aliases.get(name) {
            Some(fqn) => ctx.class(fqn),
            None => ctx.class(name),
        }
    }
}

/// The type a form type declares as its parent through `getParent()`.
pub fn form_parent(ctx: &AnalysisContext<'_>, class: &Arc<PhpClass>) -> Option<String> {
    let owner = ctx.method_owner(class, "getParent")?;
    let method = owner.own_method("getParent")?;
    returned_values(method)
        .into_iter()
        .flat_map(|value| type_names(value, &owner))
        .next()
}

/// Type names an expression stands for: string literals and `X::class`
/// constants, through arrays and ternaries. `self`/`static`/`parent` are
/// resolved against `class`.
pub(crate) fn type_names(expr: &Expr, class: &PhpClass) -> IndexSet<String> {
    let mut names = IndexSet::new();
    match &expr.kind {
        ExprKind::ClassConstant {
            class: scope,
            constant,
        } if constant.eq_ignore_ascii_case("class") => {
            let resolved = match scope.as_str() {
                "self" | "static" => Some(class.fqn.clone()),
                "parent" => class.parent.clone(),
                other => Some(other.trim_start_matches('\\').to_string()),
            };
            names.extend(resolved);
        }
        ExprKind::Array(elements) => {
            for value in elements
                .iter()
                .filter(|e| e.key.is_none())
                .filter_map(|e| e.value.as_ref())
            {
                names.extend(type_names(value, class));
            }
        }
        ExprKind::Ternary {
            then, otherwise, ..
        } => {
            for branch in [then, otherwise].into_iter().flatten() {
                names.extend(type_names(branch, class));
            }
        }
        _ => names.extend(
            extract_literals(expr)
                .into_iter()
                .map(|name| name.trim().trim_start_matches('\\').to_string())
                .filter(|name| !name.is_empty()),
        ),
    }
    names
}

/// First non-blank literal returned by a method declared on `class` itself.
fn own_literal(class: &PhpClass, method: &str) -> Option<String> {
    let method = class.own_method(method)?;
    returned_values(method)
        .into_iter()
        .flat_map(extract_literals)
        .find(|value| !value.trim().is_empty())
}
