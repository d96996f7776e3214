//! Query entry points for editor integrations.
//!
//! `FormAnalyzer` bundles the project state of one query and exposes the
//! option, extension and view variable analyses in the shapes an editor
//! needs: merged maps, completion entries and declaration targets.

use crate::context::AnalysisContext;
use crate::extensions::{extended_type_classes, extension_options, visit_extension_options};
use crate::hierarchy;
use crate::options::{FormOptionVisitor, OptionSource};
use crate::view_vars::collect_view_vars;
use crate::FormConfig;
use formscope_index::{ClassIndex, ServiceRegistry};
use formscope_parser::literals::array_key_entries;
use formscope_types::{Callee, FormClassRef, FormOption, OptionKind, PhpClass, SourceLocation};
use indexmap::{IndexMap, IndexSet};
use lsp_types::{CompletionItem, CompletionItemKind, CompletionItemLabelDetails};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Suffix dropped from shortened extension class names in labels.
const EXTENSION_SUFFIX: &str = "Extension";

/// A completion entry for a form option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionLookup {
    pub option: String,
    /// Short name of the declaring class.
    pub type_text: String,
    pub is_weak: bool,
}

impl OptionLookup {
    pub fn new(option: &str, form_class: &FormClassRef) -> Self {
        OptionLookup {
            option: option.to_string(),
            type_text: type_text(form_class.fqn()),
            is_weak: form_class.is_weak,
        }
    }

    pub fn from_option(option: &FormOption) -> Self {
        Self::new(&option.name, &option.form_class)
    }

    pub fn to_completion_item(&self) -> CompletionItem {
        CompletionItem {
            label: self.option.clone(),
            kind: Some(CompletionItemKind::PROPERTY),
            detail: Some(self.type_text.clone()),
            label_details: Some(CompletionItemLabelDetails {
                detail: None,
                description: Some(self.type_text.clone()),
            }),
            // weak entries sort after the ones backed by code
            sort_text: self
                .is_weak
                .then(|| format!("~{}", self.option)),
            ..Default::default()
        }
    }
}

/// Display name of a declaring class: the last namespace segment, without
/// a trailing `Extension` once shortened.
pub fn type_text(fqn: &str) -> String {
    match fqn.rsplit_once('\\') {
        Some((_, short)) => short
            .strip_suffix(EXTENSION_SUFFIX)
            .unwrap_or(short)
            .to_string(),
        None => fqn.to_string(),
    }
}

/// Collects lookups, keeping the first declaration of each option.
#[derive(Debug, Default)]
struct LookupCollector {
    seen: HashSet<String>,
    lookups: Vec<OptionLookup>,
}

impl FormOptionVisitor for LookupCollector {
    fn visit(
        &mut self,
        _source: OptionSource<'_>,
        option: &str,
        form_class: &FormClassRef,
        _kind: OptionKind,
    ) {
        if self.seen.insert(option.to_string()) {
            self.lookups.push(OptionLookup::new(option, form_class));
        }
    }
}

/// Form analysis over one snapshot of project state.
#[derive(Clone, Copy)]
pub struct FormAnalyzer<'a> {
    ctx: AnalysisContext<'a>,
}

impl<'a> FormAnalyzer<'a> {
    pub fn new(
        index: &'a dyn ClassIndex,
        services: &'a dyn ServiceRegistry,
        config: &'a FormConfig,
    ) -> Self {
        FormAnalyzer {
            ctx: AnalysisContext::new(index, services, config),
        }
    }

    pub fn from_context(ctx: AnalysisContext<'a>) -> Self {
        FormAnalyzer { ctx }
    }

    pub fn context(&self) -> &AnalysisContext<'a> {
        &self.ctx
    }

    /// Extension classes registered against any of `form_type_names`.
    pub fn extended_type_classes(&self, form_type_names: &[&str]) -> Vec<FormClassRef> {
        extended_type_classes(&self.ctx, form_type_names)
    }

    /// Options contributed by the extensions of `form_type_names`.
    pub fn form_extension_keys(&self, form_type_names: &[&str]) -> IndexMap<String, FormOption> {
        extension_options(&self.ctx, form_type_names)
    }

    /// Option name → declaring class FQN for a form type and its parents.
    pub fn form_default_keys(&self, form_type: &str) -> HashMap<String, String> {
        let mut keys = HashMap::new();
        self.visit_form_default_keys(
            form_type,
            &mut |_: OptionSource<'_>, option: &str, form_class: &FormClassRef, _: OptionKind| {
                keys.insert(option.to_string(), form_class.fqn().to_string());
            },
        );
        keys
    }

    pub fn visit_form_default_keys(&self, form_type: &str, visitor: &mut dyn FormOptionVisitor) {
        hierarchy::visit_form_default_keys(&self.ctx, form_type, visitor);
    }

    /// Every option of a form type: own, parents' and extensions'.
    pub fn form_options(&self, form_type: &str) -> IndexMap<String, FormOption> {
        hierarchy::resolve_options(&self.ctx, form_type)
    }

    pub fn visit_form_options(&self, form_type: &str, visitor: &mut dyn FormOptionVisitor) {
        hierarchy::visit_form_options(&self.ctx, form_type, visitor);
    }

    pub fn form_view_vars(&self, form_type_names: &[&str]) -> IndexSet<String> {
        collect_view_vars(&self.ctx, form_type_names)
    }

    pub fn form_extension_keys_lookup(&self, form_type_names: &[&str]) -> Vec<OptionLookup> {
        let mut collector = LookupCollector::default();
        visit_extension_options(&self.ctx, form_type_names, &mut collector);
        collector.lookups
    }

    pub fn default_option_lookup(&self, form_type: &str) -> Vec<OptionLookup> {
        let mut collector = LookupCollector::default();
        self.visit_form_default_keys(form_type, &mut collector);
        collector.lookups
    }

    /// Where the extension option `value` is given its default.
    pub fn form_extension_key_targets(
        &self,
        value: &str,
        form_type_names: &[&str],
    ) -> Vec<SourceLocation> {
        let options = self.form_extension_keys(form_type_names);
        let Some(option) = options.get(value) else {
            return Vec::new();
        };
        self.default_declarations(&option.form_class.class, value)
    }

    /// Where the option `value` of a form type or its parents is declared.
    pub fn default_option_targets(&self, value: &str, form_type: &str) -> Vec<SourceLocation> {
        if value.trim().is_empty() {
            return Vec::new();
        }
        let mut targets = Vec::new();
        self.visit_form_default_keys(
            form_type,
            &mut |source: OptionSource<'_>, option: &str, _: &FormClassRef, _: OptionKind| {
                if option == value {
                    targets.push(SourceLocation {
                        uri: source.uri.to_string(),
                        range: source.key.range,
                    });
                }
            },
        );
        targets
    }

    /// `setDefaults` keys equal to `value` in the option methods of `class`.
    fn default_declarations(
        &self,
        class: &Arc<PhpClass>,
        value: &str,
    ) -> Vec<SourceLocation> {
        let mut targets = Vec::new();
        for method_name in &self.ctx.config.option_methods {
            let Some(owner) = self.ctx.method_owner(class, method_name) else {
                continue;
            };
            let Some(body) = owner.own_method(method_name).and_then(|m| m.body.as_ref()) else {
                continue;
            };
            let declaration = body
                .calls()
                .into_iter()
                .filter(|call| matches!(call.callee, Callee::Method(_)))
                .filter(|call| call.is_named(OptionKind::Default.setter()))
                .filter_map(|call| call.first_argument())
                .flat_map(array_key_entries)
                .find(|(key, _)| key == value);
            if let Some((_, entry)) = declaration {
                let target = SourceLocation {
                    uri: owner.uri.clone(),
                    range: entry.key_node.range,
                };
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }
}
