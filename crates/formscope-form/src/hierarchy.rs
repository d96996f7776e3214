//! Form type hierarchy walk.
//!
//! Collects the options of a form type, the extensions registered against
//! it and, recursively, of its `getParent()` chain. The chain is followed
//! for at most `max_depth` hops so cyclic parents terminate.

use crate::context::AnalysisContext;
use crate::extensions::visit_extension_options;
use crate::options::{visit_class_options, FormOptionMap, FormOptionVisitor};
use crate::types::{form_parent, FormTypeCollector};
use formscope_types::{FormClassRef, FormClassRole, FormOption};
use indexmap::IndexMap;

/// Report the options of `form_type`, its extensions and its parents.
pub fn visit_form_options(
    ctx: &AnalysisContext<'_>,
    form_type: &str,
    visitor: &mut dyn FormOptionVisitor,
) {
    let collector = FormTypeCollector::collect(ctx);
    walk(ctx, &collector, form_type, true, 0, visitor);
}

/// Report the options of `form_type` and its parents, without extensions.
pub fn visit_form_default_keys(
    ctx: &AnalysisContext<'_>,
    form_type: &str,
    visitor: &mut dyn FormOptionVisitor,
) {
    let collector = FormTypeCollector::collect(ctx);
    walk(ctx, &collector, form_type, false, 0, visitor);
}

/// Effective options of a form type, merged by name.
pub fn resolve_options(ctx: &AnalysisContext<'_>, form_type: &str) -> IndexMap<String, FormOption> {
    let mut map = FormOptionMap::new();
    visit_form_options(ctx, form_type, &mut map);
    map.into_options()
}

fn walk(
    ctx: &AnalysisContext<'_>,
    collector: &FormTypeCollector,
    form_type: &str,
    with_extensions: bool,
    depth: usize,
    visitor: &mut dyn FormOptionVisitor,
) {
    let Some(class) = collector.resolve(ctx, form_type) else {
        tracing::debug!("form type {} does not resolve to a class", form_type);
        return;
    };

    let own = FormClassRef::new(FormClassRole::FormType, class.clone(), false);
    visit_class_options(ctx, &class, &own, visitor);

    if with_extensions {
        // Extensions may name the type by alias or by class
        let mut names = vec![form_type, class.fqn.as_str()];
        names.extend(collector.aliases_of(&class.fqn));
        visit_extension_options(ctx, &names, visitor);
    }

    if depth >= ctx.config.max_depth {
        tracing::debug!(
            "stopped walking parents of {} at depth {}",
            form_type,
            depth
        );
        return;
    }
    if let Some(parent) = form_parent(ctx, &class) {
        walk(ctx, collector, &parent, with_extensions, depth + 1, visitor);
    }
}
