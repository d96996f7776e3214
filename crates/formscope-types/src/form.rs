//! Form option records.

use crate::class::PhpClass;
use crate::expr::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Why a class takes part in an option query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormClassRole {
    FormType,
    Extension,
}

/// A class contributing options, tagged with its role.
#[derive(Debug, Clone)]
pub struct FormClassRef {
    pub role: FormClassRole,
    pub class: Arc<PhpClass>,
    /// Extension only known from service registration, not from the
    /// class hierarchy. Affects display only.
    pub is_weak: bool,
}

impl FormClassRef {
    pub fn new(role: FormClassRole, class: Arc<PhpClass>, is_weak: bool) -> Self {
        FormClassRef {
            role,
            class,
            is_weak,
        }
    }

    pub fn fqn(&self) -> &str {
        &self.class.fqn
    }
}

/// Option modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Default,
    Required,
    Optional,
    Defined,
}

impl OptionKind {
    /// Map an options-resolver setter name to its modifier.
    pub fn from_setter(method: &str) -> Option<Self> {
        [
            OptionKind::Default,
            OptionKind::Required,
            OptionKind::Optional,
            OptionKind::Defined,
        ]
        .into_iter()
        .find(|kind| kind.setter().eq_ignore_ascii_case(method))
    }

    pub fn setter(self) -> &'static str {
        match self {
            OptionKind::Default => "setDefaults",
            OptionKind::Required => "setRequired",
            OptionKind::Optional => "setOptional",
            OptionKind::Defined => "setDefined",
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptionKind::Default => "default",
            OptionKind::Required => "required",
            OptionKind::Optional => "optional",
            OptionKind::Defined => "defined",
        };
        write!(f, "{}", name)
    }
}

/// A resolved form option.
#[derive(Debug, Clone)]
pub struct FormOption {
    pub name: String,
    pub form_class: FormClassRef,
    pub kinds: BTreeSet<OptionKind>,
    /// Literal default value, when one was declared and is static.
    pub default_value: Option<String>,
}

impl FormOption {
    pub fn new(name: impl Into<String>, form_class: FormClassRef, kind: OptionKind) -> Self {
        FormOption {
            name: name.into(),
            form_class,
            kinds: BTreeSet::from([kind]),
            default_value: None,
        }
    }

    pub fn add_kind(&mut self, kind: OptionKind) {
        self.kinds.insert(kind);
    }

    pub fn has_kind(&self, kind: OptionKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// A location in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub uri: String,
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassKind;

    fn form_class() -> FormClassRef {
        FormClassRef::new(
            FormClassRole::Extension,
            Arc::new(PhpClass {
                name: "HelpExtension".into(),
                fqn: "App\\HelpExtension".into(),
                kind: ClassKind::Class,
                uri: "file:///HelpExtension.php".into(),
                range: (0, 0, 0, 0),
                is_abstract: false,
                parent: None,
                interfaces: vec![],
                methods: vec![],
            }),
            false,
        )
    }

    #[test]
    fn test_from_setter() {
        assert_eq!(OptionKind::from_setter("setDefaults"), Some(OptionKind::Default));
        assert_eq!(OptionKind::from_setter("setrequired"), Some(OptionKind::Required));
        assert_eq!(OptionKind::from_setter("setOptional"), Some(OptionKind::Optional));
        assert_eq!(OptionKind::from_setter("setDefined"), Some(OptionKind::Defined));
        assert_eq!(OptionKind::from_setter("setAllowedTypes"), None);
    }

    #[test]
    fn test_kinds_accumulate() {
        let mut option = FormOption::new("help", form_class(), OptionKind::Required);
        option.add_kind(OptionKind::Defined);
        option.add_kind(OptionKind::Required);
        assert_eq!(option.kinds.len(), 2);
        assert!(option.has_kind(OptionKind::Required));
        assert!(option.has_kind(OptionKind::Defined));
        assert!(!option.has_kind(OptionKind::Default));
        assert_eq!(option.form_class.fqn(), "App\\HelpExtension");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OptionKind::Default.to_string(), "default");
        assert_eq!(OptionKind::Defined.to_string(), "defined");
    }
}
