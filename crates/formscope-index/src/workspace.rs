//! Project-wide class index.

use dashmap::DashMap;
use formscope_types::PhpClass;
use std::collections::HashSet;
use std::sync::Arc;

/// Class lookup consumed by the form analyses.
pub trait ClassIndex {
    /// Resolve a fully qualified class name. A leading `\` is ignored and
    /// matching is case-insensitive, as in PHP.
    fn get_class(&self, fqn: &str) -> Option<Arc<PhpClass>>;

    /// Every class that extends or implements `fqn`, directly or through
    /// other indexed classes. Sorted by FQN.
    fn all_subclasses(&self, fqn: &str) -> Vec<Arc<PhpClass>>;
}

/// Global index of all classes in the project.
pub struct ProjectIndex {
    /// Lowercased FQN → class
    pub classes: DashMap<String, Arc<PhpClass>>,

    /// File URI → classes declared in that file
    pub file_classes: DashMap<String, Vec<Arc<PhpClass>>>,
}

fn index_key(fqn: &str) -> String {
    fqn.trim_start_matches('\\').to_ascii_lowercase()
}

impl ProjectIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        ProjectIndex {
            classes: DashMap::new(),
            file_classes: DashMap::new(),
        }
    }

    /// Replace the classes of a single file.
    pub fn update_file(&self, uri: &str, classes: Vec<PhpClass>) {
        self.remove_file(uri);

        let classes: Vec<Arc<PhpClass>> = classes.into_iter().map(Arc::new).collect();
        for class in &classes {
            if let Some(previous) = self.classes.insert(index_key(&class.fqn), class.clone()) {
                if previous.uri != class.uri {
                    tracing::debug!(
                        "{} declared in both {} and {}, keeping the latter",
                        class.fqn,
                        previous.uri,
                        class.uri
                    );
                }
            }
        }

        self.file_classes.insert(uri.to_string(), classes);
    }

    /// Remove all classes declared in a file.
    pub fn remove_file(&self, uri: &str) {
        if let Some((_, old_classes)) = self.file_classes.remove(uri) {
            for class in &old_classes {
                let key = index_key(&class.fqn);
                // Only drop the entry if this file still owns it
                if self
                    .classes
                    .remove_if(&key, |_, current| current.uri == uri)
                    .is_none()
                {
                    continue;
                }
                if let Some(other) = self.declaration_elsewhere(&key) {
                    self.classes.insert(key, other);
                }
            }
        }
    }

    /// A declaration of `key` in any indexed file.
    fn declaration_elsewhere(&self, key: &str) -> Option<Arc<PhpClass>> {
        self.file_classes.iter().find_map(|entry| {
            entry
                .value()
                .iter()
                .find(|class| index_key(&class.fqn) == key)
                .cloned()
        })
    }

    /// Classes declared in a file.
    pub fn classes_in_file(&self, uri: &str) -> Vec<Arc<PhpClass>> {
        self.file_classes
            .get(uri)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Number of indexed classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ProjectIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassIndex for ProjectIndex {
    fn get_class(&self, fqn: &str) -> Option<Arc<PhpClass>> {
        self.classes.get(&index_key(fqn)).map(|r| r.value().clone())
    }

    fn all_subclasses(&self, fqn: &str) -> Vec<Arc<PhpClass>> {
        let root = index_key(fqn);
        let mut seen = HashSet::from([root.clone()]);
        let mut pending = vec![root];
        let mut found = Vec::new();

        while let Some(target) = pending.pop() {
            for entry in self.classes.iter() {
                if seen.contains(entry.key()) {
                    continue;
                }
                let class = entry.value();
                if class.supertypes().any(|s| index_key(s) == target) {
                    seen.insert(entry.key().clone());
                    pending.push(entry.key().clone());
                    found.push(class.clone());
                }
            }
        }

        found.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formscope_parser::classes::parse_classes;

    fn index_of(files: &[(&str, &str)]) -> ProjectIndex {
        let index = ProjectIndex::new();
        for (uri, source) in files {
            index.update_file(uri, parse_classes(source, uri));
        }
        index
    }

    #[test]
    fn test_update_and_resolve() {
        let index = index_of(&[(
            "file:///FooType.php",
            "<?php\nnamespace App\\Form;\nclass FooType {}\n",
        )]);

        let found = index.get_class("App\\Form\\FooType");
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "FooType");
        assert!(index.get_class("\\app\\form\\footype").is_some());
        assert!(index.get_class("App\\Form\\BarType").is_none());
    }

    #[test]
    fn test_remove_file() {
        let index = index_of(&[("file:///a.php", "<?php\nclass Foo {}\n")]);
        assert!(index.get_class("Foo").is_some());

        index.remove_file("file:///a.php");
        assert!(index.get_class("Foo").is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_update_replaces_old() {
        let index = index_of(&[("file:///test.php", "<?php\nclass Foo {}\n")]);
        assert!(index.get_class("Foo").is_some());

        index.update_file(
            "file:///test.php",
            parse_classes("<?php\nclass Bar {}\n", "file:///test.php"),
        );
        assert!(index.get_class("Foo").is_none());
        assert!(index.get_class("Bar").is_some());
        assert_eq!(index.classes_in_file("file:///test.php").len(), 1);
    }

    #[test]
    fn test_remove_keeps_class_redeclared_elsewhere() {
        let index = index_of(&[
            ("file:///a.php", "<?php\nclass Foo {}\n"),
            ("file:///b.php", "<?php\nclass Foo {}\n"),
        ]);
        index.remove_file("file:///a.php");
        let foo = index.get_class("Foo").unwrap();
        assert_eq!(foo.uri, "file:///b.php");
    }

    #[test]
    fn test_dropping_latest_declaration_restores_earlier_one() {
        let index = index_of(&[
            ("file:///a.php", "<?php\nclass Foo extends A {}\n"),
            ("file:///b.php", "<?php\nclass Foo extends B {}\n"),
        ]);
        assert_eq!(index.get_class("Foo").unwrap().uri, "file:///b.php");

        index.update_file(
            "file:///b.php",
            parse_classes("<?php\nclass Bar {}\n", "file:///b.php"),
        );
        let foo = index.get_class("Foo").unwrap();
        assert_eq!(foo.uri, "file:///a.php");
        assert_eq!(foo.parent.as_deref(), Some("A"));

        index.remove_file("file:///a.php");
        assert!(index.get_class("Foo").is_none());
        assert!(index.get_class("Bar").is_some());
    }

    #[test]
    fn test_all_subclasses_transitive() {
        let index = index_of(&[(
            "file:///ext.php",
            r#"<?php
namespace App;
interface Marker {}
interface SubMarker extends Marker {}
abstract class Base implements SubMarker {}
class Concrete extends Base {}
class Unrelated {}
"#,
        )]);

        let names: Vec<String> = index
            .all_subclasses("App\\Marker")
            .iter()
            .map(|c| c.fqn.clone())
            .collect();
        assert_eq!(names, vec!["App\\Base", "App\\Concrete", "App\\SubMarker"]);
    }

    #[test]
    fn test_all_subclasses_cycle_terminates() {
        let index = index_of(&[(
            "file:///cycle.php",
            "<?php\nclass A extends B {}\nclass B extends A {}\n",
        )]);
        let names: Vec<String> = index
            .all_subclasses("A")
            .iter()
            .map(|c| c.fqn.clone())
            .collect();
        assert_eq!(names, vec!["B"]);
    }
}
