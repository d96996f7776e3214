//! Namespace and `use` import tracking for class name resolution.

use tree_sitter::Node;

/// A class import (`use Foo\Bar as Baz;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassImport {
    pub fqn: String,
    pub alias: Option<String>,
}

impl ClassImport {
    /// The name the import is visible under.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.fqn.rsplit('\\').next().unwrap_or(&self.fqn),
        }
    }
}

/// Namespace and imports in scope at a point of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    pub namespace: Option<String>,
    pub imports: Vec<ClassImport>,
}

impl NameContext {
    pub fn new(namespace: Option<String>) -> Self {
        NameContext {
            namespace,
            imports: Vec::new(),
        }
    }

    /// FQN of a class declared in the current namespace.
    pub fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
            _ => name.to_string(),
        }
    }

    /// Resolve a class name as written in source to its FQN.
    pub fn resolve_class_name(&self, name: &str) -> String {
        // Already fully qualified
        if let Some(stripped) = name.strip_prefix('\\') {
            return stripped.to_string();
        }

        // Special names
        let lower = name.to_ascii_lowercase();
        if matches!(lower.as_str(), "self" | "static" | "parent") {
            return lower;
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };

        if let Some(import) = self
            .imports
            .iter()
            .find(|i| i.local_name().eq_ignore_ascii_case(first))
        {
            return match rest {
                Some(rest) => format!("{}\\{}", import.fqn, rest),
                None => import.fqn.clone(),
            };
        }

        self.qualify(name)
    }

    /// Record the class imports of a `namespace_use_declaration`.
    /// Function and constant imports are ignored.
    pub fn add_use_declaration(&mut self, node: Node, source: &str) {
        if is_function_or_const_use(node, source) {
            return;
        }

        let prefix =
            group_prefix(node).map(|n| node_text(n, source).trim_start_matches('\\').to_string());

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_use_clause" => {
                    if let Some(import) = parse_use_clause(child, source, None) {
                        self.imports.push(import);
                    }
                }
                "namespace_use_group" => {
                    let mut group_cursor = child.walk();
                    for clause in child.children(&mut group_cursor) {
                        if matches!(
                            clause.kind(),
                            "namespace_use_clause" | "namespace_use_group_clause"
                        ) {
                            if let Some(import) =
                                parse_use_clause(clause, source, prefix.as_deref())
                            {
                                self.imports.push(import);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Namespace shared by a group import (`use A\B\{C, D}`). The php grammar
/// places it as a bare `namespace_name` child ahead of the group body.
fn group_prefix(node: Node) -> Option<Node> {
    if let Some(prefix) = node.child_by_field_name("prefix") {
        return Some(prefix);
    }

    let mut cursor = node.walk();
    let mut prefix = None;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "namespace_name" | "qualified_name" | "name" => prefix = Some(child),
            "namespace_use_group" => return prefix,
            _ => {}
        }
    }
    None
}

/// Parse a single use clause:
/// namespace_use_clause -> qualified_name|name, [as, name(alias)]
fn parse_use_clause(clause: Node, source: &str, prefix: Option<&str>) -> Option<ClassImport> {
    let mut name: Option<String> = None;
    let mut alias: Option<String> = None;
    let mut saw_as = false;

    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "qualified_name" | "namespace_name" | "name" if !saw_as => {
                if name.is_none() {
                    name = Some(node_text(child, source).trim_start_matches('\\').to_string());
                } else {
                    // `use Foo\Bar Baz` is not valid PHP, but grammars that
                    // expose the alias without an `as` child end up here.
                    alias = Some(node_text(child, source).to_string());
                }
            }
            "as" => saw_as = true,
            "name" if saw_as => alias = Some(node_text(child, source).to_string()),
            _ => {}
        }
    }

    let name = name?;
    let fqn = match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}\\{}", prefix, name),
        _ => name,
    };
    Some(ClassImport { fqn, alias })
}

fn is_function_or_const_use(node: Node, source: &str) -> bool {
    let text = node_text(node, source);
    let rest = text.strip_prefix("use").unwrap_or(text).trim_start();
    rest.starts_with("function ") || rest.starts_with("const ")
}

pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FileParser;

    fn context_for(code: &str) -> NameContext {
        let mut parser = FileParser::new();
        parser.parse_full(code);
        let tree = parser.tree().unwrap();
        let root = tree.root_node();
        let mut ctx = NameContext::new(Some("App\\Form".into()));
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "namespace_use_declaration" {
                ctx.add_use_declaration(child, code);
            }
        }
        ctx
    }

    #[test]
    fn test_resolve_imported_names() {
        let ctx = context_for(
            "<?php\nuse Symfony\\Component\\Form\\AbstractType;\nuse Symfony\\Component\\Form\\Extension\\Core\\Type as Core;\n",
        );
        assert_eq!(
            ctx.resolve_class_name("AbstractType"),
            "Symfony\\Component\\Form\\AbstractType"
        );
        assert_eq!(
            ctx.resolve_class_name("Core\\TextType"),
            "Symfony\\Component\\Form\\Extension\\Core\\Type\\TextType"
        );
    }

    #[test]
    fn test_resolve_unimported_and_qualified() {
        let ctx = NameContext::new(Some("App\\Form".into()));
        assert_eq!(ctx.resolve_class_name("FooType"), "App\\Form\\FooType");
        assert_eq!(ctx.resolve_class_name("\\Other\\BarType"), "Other\\BarType");
        assert_eq!(ctx.resolve_class_name("parent"), "parent");
    }

    #[test]
    fn test_group_use() {
        let ctx = context_for("<?php\nuse Symfony\\Component\\Form\\{AbstractType, FormView as View};\n");
        assert_eq!(
            ctx.resolve_class_name("AbstractType"),
            "Symfony\\Component\\Form\\AbstractType"
        );
        assert_eq!(ctx.resolve_class_name("View"), "Symfony\\Component\\Form\\FormView");
    }

    #[test]
    fn test_function_use_ignored() {
        let ctx = context_for("<?php\nuse function App\\helper;\n");
        assert!(ctx.imports.is_empty());
    }

    #[test]
    fn test_no_namespace() {
        let ctx = NameContext::default();
        assert_eq!(ctx.resolve_class_name("FooType"), "FooType");
    }
}
