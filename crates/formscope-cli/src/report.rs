//! JSON shapes printed by the commands.

use formscope_form::OptionLookup;
use formscope_types::{FormClassRef, FormClassRole, FormOption, OptionKind, TwigBlock};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ClassReport {
    pub class: String,
    pub role: FormClassRole,
    pub weak: bool,
}

impl From<&FormClassRef> for ClassReport {
    fn from(form_class: &FormClassRef) -> Self {
        ClassReport {
            class: form_class.fqn().to_string(),
            role: form_class.role,
            weak: form_class.is_weak,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionReport {
    pub name: String,
    pub kinds: Vec<OptionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub declared_by: ClassReport,
    /// Label shown in completion lists.
    pub label: String,
}

impl From<&FormOption> for OptionReport {
    fn from(option: &FormOption) -> Self {
        OptionReport {
            name: option.name.clone(),
            kinds: option.kinds.iter().copied().collect(),
            default: option.default_value.clone(),
            declared_by: ClassReport::from(&option.form_class),
            label: OptionLookup::from_option(option).type_text,
        }
    }
}

pub fn option_reports(options: &IndexMap<String, FormOption>) -> Vec<OptionReport> {
    options.values().map(OptionReport::from).collect()
}

#[derive(Debug, Serialize)]
pub struct ExtensionsReport {
    pub extensions: Vec<ClassReport>,
    pub options: Vec<OptionReport>,
}

#[derive(Debug, Serialize)]
pub struct DefaultKeysReport {
    pub form_type: String,
    /// Option name → declaring class.
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ViewVarsReport {
    pub form_types: Vec<String>,
    pub vars: IndexSet<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateReport {
    pub extends: IndexSet<String>,
    pub includes: IndexSet<String>,
    pub blocks: Vec<TwigBlock>,
}
