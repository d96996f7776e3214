//! Form type extension discovery.

use crate::context::{returned_values, AnalysisContext};
use crate::options::{visit_class_options, FormOptionMap, FormOptionVisitor};
use crate::types::type_names;
use formscope_types::{FormClassRef, FormClassRole, FormOption, PhpClass};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Methods returning the type(s) an extension applies to: the single-type
/// API of older framework versions and the iterable one of newer versions.
const EXTENDED_TYPE_METHODS: &[&str] = &["getExtendedType", "getExtendedTypes"];

/// An extension class and what it was registered against.
#[derive(Debug, Clone)]
pub struct ExtensionCandidate {
    pub class: Arc<PhpClass>,
    /// Extended types declared by the service registration.
    pub registered_types: IndexSet<String>,
    /// Only known from the service registration.
    pub is_weak: bool,
}

/// Every known extension class: registered services resolvable in the
/// index and concrete implementers of the extension interface.
pub fn extension_candidates(ctx: &AnalysisContext<'_>) -> Vec<ExtensionCandidate> {
    let mut candidates: IndexMap<String, ExtensionCandidate> = IndexMap::new();

    for (class_name, registered_types) in ctx.services.form_extensions() {
        let Some(class) = ctx.class(&class_name) else {
            tracing::debug!("registered form extension {} is not indexed", class_name);
            continue;
        };
        candidates.insert(
            class.fqn.to_ascii_lowercase(),
            ExtensionCandidate {
                class,
                registered_types,
                is_weak: true,
            },
        );
    }

    for class in ctx.index.all_subclasses(&ctx.config.form_extension_interface) {
        if !class.is_instantiable() {
            continue;
        }
        candidates
            .entry(class.fqn.to_ascii_lowercase())
            .and_modify(|candidate| candidate.is_weak = false)
            .or_insert(ExtensionCandidate {
                class,
                registered_types: IndexSet::new(),
                is_weak: false,
            });
    }

    candidates.into_values().collect()
}

/// Types an extension applies to, from its code and its registration.
pub fn extended_types(ctx: &AnalysisContext<'_>, candidate: &ExtensionCandidate) -> IndexSet<String> {
    let mut types = IndexSet::new();
    for method_name in EXTENDED_TYPE_METHODS {
        let Some(owner) = ctx.method_owner(&candidate.class, method_name) else {
            continue;
        };
        let Some(method) = owner.own_method(method_name) else {
            continue;
        };
        for value in returned_values(method) {
            types.extend(type_names(value, &owner));
        }
    }
    types.extend(
        candidate
            .registered_types
            .iter()
            .map(|registered| registered.trim_start_matches('\\').to_string()),
    );
    types
}

/// Extensions registered against any of `form_type_names` (class names,
/// with or without leading `\`, or aliases).
pub fn extended_type_classes(
    ctx: &AnalysisContext<'_>,
    form_type_names: &[&str],
) -> Vec<FormClassRef> {
    let names: Vec<&str> = form_type_names
        .iter()
        .map(|name| name.trim().trim_start_matches('\\'))
        .filter(|name| !name.is_empty())
        .collect();

    extension_candidates(ctx)
        .into_iter()
        .filter(|candidate| {
            extended_types(ctx, candidate)
                .iter()
                .any(|extended| names.iter().any(|name| name.eq_ignore_ascii_case(extended)))
        })
        .map(|candidate| FormClassRef::new(FormClassRole::Extension, candidate.class, candidate.is_weak))
        .collect()
}

/// Report the options declared by the extensions of `form_type_names`.
pub fn visit_extension_options(
    ctx: &AnalysisContext<'_>,
    form_type_names: &[&str],
    visitor: &mut dyn FormOptionVisitor,
) {
    for extension in extended_type_classes(ctx, form_type_names) {
        let class = extension.class.clone();
        visit_class_options(ctx, &class, &extension, visitor);
    }
}

/// Options declared by the extensions of `form_type_names`, merged by name.
pub fn extension_options(
    ctx: &AnalysisContext<'_>,
    form_type_names: &[&str],
) -> IndexMap<String, FormOption> {
    let mut map = FormOptionMap::new();
    visit_extension_options(ctx, form_type_names, &mut map);
    map.into_options()
}
