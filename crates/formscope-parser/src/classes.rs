//! Extract the class model of a PHP file from the tree-sitter CST.
//!
//! Walks the CST and produces one `PhpClass` per class, interface, trait or
//! enum declaration, with supertypes resolved against the namespace and
//! `use` imports in scope and method bodies lowered to `Expr` trees.

use crate::lower::{lower, node_range};
use crate::names::{node_text, NameContext};
use crate::parser::FileParser;
use formscope_types::{ClassKind, PhpClass, PhpMethod};
use tree_sitter::{Node, Tree};

/// Parse PHP source and extract its classes.
pub fn parse_classes(source: &str, uri: &str) -> Vec<PhpClass> {
    let mut parser = FileParser::new();
    parser.parse_full(source);
    match parser.tree() {
        Some(tree) => extract_classes(tree, source, uri),
        None => {
            tracing::debug!("tree-sitter produced no tree for {}", uri);
            Vec::new()
        }
    }
}

/// Extract all class-like declarations from a parsed PHP file.
pub fn extract_classes(tree: &Tree, source: &str, uri: &str) -> Vec<PhpClass> {
    let mut classes = Vec::new();
    let root = tree.root_node();

    // Walk top-level children of program node.
    // Handle namespace-without-braces by tracking the current context.
    let mut names = NameContext::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "namespace_definition" => {
                let namespace = find_namespace_name(child, source);
                if let Some(body) = child.child_by_field_name("body") {
                    let mut scoped = NameContext::new(namespace);
                    extract_children(body, source, uri, &mut scoped, &mut classes);
                } else {
                    // Namespace applies to rest of file
                    names = NameContext::new(namespace);
                }
            }
            _ => extract_from_node(child, source, uri, &mut names, &mut classes),
        }
    }

    classes
}

/// Find the namespace name from a namespace_definition node.
/// The name is in a `namespace_name` child (not field "name").
fn find_namespace_name(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "namespace_name" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn extract_from_node(
    node: Node,
    source: &str,
    uri: &str,
    names: &mut NameContext,
    classes: &mut Vec<PhpClass>,
) {
    match node.kind() {
        "namespace_use_declaration" => names.add_use_declaration(node, source),
        "class_declaration" => {
            classes.extend(extract_class_like(node, source, uri, names, ClassKind::Class));
        }
        "interface_declaration" => {
            classes.extend(extract_class_like(node, source, uri, names, ClassKind::Interface));
        }
        "trait_declaration" => {
            classes.extend(extract_class_like(node, source, uri, names, ClassKind::Trait));
        }
        "enum_declaration" => {
            classes.extend(extract_class_like(node, source, uri, names, ClassKind::Enum));
        }
        // Function bodies do not declare classes we care about
        "function_definition" | "comment" | "text" | "text_interpolation" => {}
        _ => extract_children(node, source, uri, names, classes),
    }
}

fn extract_children(
    node: Node,
    source: &str,
    uri: &str,
    names: &mut NameContext,
    classes: &mut Vec<PhpClass>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_from_node(child, source, uri, names, classes);
    }
}

/// Extract a class-like declaration (class, interface, trait, enum).
fn extract_class_like(
    node: Node,
    source: &str,
    uri: &str,
    names: &NameContext,
    kind: ClassKind,
) -> Option<PhpClass> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(name_node, source).to_string();
    let fqn = names.qualify(&name);

    let mut parent = None;
    let mut interfaces = Vec::new();
    let mut is_abstract = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "abstract_modifier" => is_abstract = true,
            "base_clause" => {
                let extended = clause_names(child, source, names);
                if kind == ClassKind::Interface {
                    // Interfaces may extend several interfaces
                    interfaces.extend(extended);
                } else {
                    parent = extended.into_iter().next();
                }
            }
            "class_interface_clause" => interfaces.extend(clause_names(child, source, names)),
            _ => {}
        }
    }

    let methods = match node.child_by_field_name("body") {
        Some(body) => extract_methods(body, source, names),
        None => Vec::new(),
    };

    Some(PhpClass {
        name,
        fqn,
        kind,
        uri: uri.to_string(),
        range: node_range(node),
        is_abstract,
        parent,
        interfaces,
        methods,
    })
}

/// Resolved names listed in an `extends` / `implements` clause.
fn clause_names(clause: Node, source: &str, names: &NameContext) -> Vec<String> {
    let mut cursor = clause.walk();
    let resolved = clause
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "name" || c.kind() == "qualified_name")
        .map(|c| names.resolve_class_name(node_text(c, source)))
        .collect();
    resolved
}

/// Extract methods from a class/interface/trait/enum body.
fn extract_methods(body: Node, source: &str, names: &NameContext) -> Vec<PhpMethod> {
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() != "method_declaration" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };

        let mut is_static = false;
        let mut is_abstract = false;
        let mut modifier_cursor = child.walk();
        for modifier in child.children(&mut modifier_cursor) {
            match modifier.kind() {
                "static_modifier" => is_static = true,
                "abstract_modifier" => is_abstract = true,
                _ => {}
            }
        }

        methods.push(PhpMethod {
            name: node_text(name_node, source).to_string(),
            range: node_range(child),
            is_static,
            is_abstract,
            body: child
                .child_by_field_name("body")
                .map(|b| lower(b, source, names)),
        });
    }
    methods
}
