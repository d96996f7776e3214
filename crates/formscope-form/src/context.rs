//! Injected project state shared by the analyses.

use crate::config::FormConfig;
use formscope_index::{ClassIndex, ServiceRegistry};
use formscope_types::{Expr, ExprKind, PhpClass, PhpMethod};
use std::collections::HashSet;
use std::sync::Arc;

/// Class index, service registrations and configuration of one query.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub index: &'a dyn ClassIndex,
    pub services: &'a dyn ServiceRegistry,
    pub config: &'a FormConfig,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        index: &'a dyn ClassIndex,
        services: &'a dyn ServiceRegistry,
        config: &'a FormConfig,
    ) -> Self {
        AnalysisContext {
            index,
            services,
            config,
        }
    }

    /// Resolve a class by FQN (leading `\` allowed).
    pub fn class(&self, fqn: &str) -> Option<Arc<PhpClass>> {
        let fqn = fqn.trim().trim_start_matches('\\');
        if fqn.is_empty() {
            return None;
        }
        self.index.get_class(fqn)
    }

    /// The class `class` extends, if it is indexed.
    pub fn parent_class(&self, class: &PhpClass) -> Option<Arc<PhpClass>> {
        let parent = class.parent.as_deref()?;
        let resolved = self.class(parent);
        if resolved.is_none() {
            tracing::debug!("parent {} of {} is not indexed", parent, class.fqn);
        }
        resolved
    }

    /// The class declaring `method` as seen from `class`: the class
    /// itself or its closest ancestor that has it.
    pub fn method_owner(&self, class: &Arc<PhpClass>, method: &str) -> Option<Arc<PhpClass>> {
        let mut visited = HashSet::new();
        let mut current = class.clone();
        loop {
            if current.own_method(method).is_some() {
                return Some(current);
            }
            if !visited.insert(current.fqn.to_ascii_lowercase()) {
                return None;
            }
            current = self.parent_class(&current)?;
        }
    }
}

/// Expressions a method returns or yields.
pub(crate) fn returned_values(method: &PhpMethod) -> Vec<&Expr> {
    let Some(body) = &method.body else {
        return Vec::new();
    };
    body.descendants()
        .into_iter()
        .filter_map(|node| match &node.kind {
            ExprKind::Return(Some(value)) | ExprKind::Yield(Some(value)) => Some(value.as_ref()),
            _ => None,
        })
        .collect()
}
