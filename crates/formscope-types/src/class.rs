//! PHP class model extracted from a parsed file.

use crate::expr::{Expr, Range};
use serde::{Deserialize, Serialize};

/// Kind of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// A class-like declaration with its methods lowered to expression trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhpClass {
    /// Short name (e.g. "TextType")
    pub name: String,
    /// Fully Qualified Name without leading backslash
    pub fqn: String,
    pub kind: ClassKind,
    /// File URI
    pub uri: String,
    pub range: Range,
    pub is_abstract: bool,
    /// Resolved FQN of the `extends` target. Always `None` for interfaces,
    /// which list the interfaces they extend in `interfaces`.
    pub parent: Option<String>,
    /// Resolved FQNs of implemented (or extended, for interfaces) interfaces.
    pub interfaces: Vec<String>,
    pub methods: Vec<PhpMethod>,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhpMethod {
    pub name: String,
    pub range: Range,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Lowered body; `None` for abstract and interface methods.
    pub body: Option<Expr>,
}

impl PhpClass {
    /// Look up a method declared directly on this class.
    pub fn own_method(&self, name: &str) -> Option<&PhpMethod> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Concrete classes only: no interfaces, traits or abstract classes.
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Class && !self.is_abstract
    }

    /// Names this class directly extends or implements.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.parent
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(kind: ClassKind, is_abstract: bool) -> PhpClass {
        PhpClass {
            name: "FooType".into(),
            fqn: "App\\Form\\FooType".into(),
            kind,
            uri: "file:///FooType.php".into(),
            range: (0, 0, 10, 0),
            is_abstract,
            parent: Some("Symfony\\Component\\Form\\AbstractType".into()),
            interfaces: vec!["App\\Form\\Marker".into()],
            methods: vec![PhpMethod {
                name: "configureOptions".into(),
                range: (1, 4, 3, 5),
                is_static: false,
                is_abstract: false,
                body: None,
            }],
        }
    }

    #[test]
    fn test_own_method_ignores_case() {
        let c = class(ClassKind::Class, false);
        assert!(c.own_method("CONFIGUREOPTIONS").is_some());
        assert!(c.own_method("buildView").is_none());
    }

    #[test]
    fn test_is_instantiable() {
        assert!(class(ClassKind::Class, false).is_instantiable());
        assert!(!class(ClassKind::Class, true).is_instantiable());
        assert!(!class(ClassKind::Interface, false).is_instantiable());
    }

    #[test]
    fn test_supertypes() {
        let c = class(ClassKind::Class, false);
        let supers: Vec<&str> = c.supertypes().collect();
        assert_eq!(
            supers,
            vec!["Symfony\\Component\\Form\\AbstractType", "App\\Form\\Marker"]
        );
    }
}
