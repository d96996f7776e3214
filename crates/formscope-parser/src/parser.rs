//! FileParser: tree-sitter PHP parsing of a single source file.

use tree_sitter::{Parser, Tree};

/// Manages parsing state for a single PHP file.
pub struct FileParser {
    parser: Parser,
    tree: Option<Tree>,
    source: String,
}

impl FileParser {
    /// Create a new FileParser with tree-sitter-php language.
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .expect("Failed to set tree-sitter PHP language");

        FileParser {
            parser,
            tree: None,
            source: String::new(),
        }
    }

    /// Full parse of a source string.
    pub fn parse_full(&mut self, source: &str) {
        self.source = source.to_string();
        self.tree = self.parser.parse(source.as_bytes(), None);
    }

    /// Get the current tree-sitter Tree (if parsed successfully).
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Get the source the current tree was built from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_simple_class() {
        let mut parser = FileParser::new();
        parser.parse_full("<?php\nclass FooType {\n    public function configureOptions($r): void {}\n}\n");

        let tree = parser.tree().expect("Should have a tree");
        let root = tree.root_node();
        assert_eq!(root.kind(), "program");
        assert!(!root.has_error());
    }

    #[test]
    fn test_parse_full_with_error() {
        let mut parser = FileParser::new();
        parser.parse_full("<?php\nfunction foo( {\n}\n");

        let tree = parser.tree().expect("Should have a tree");
        let root = tree.root_node();
        assert_eq!(root.kind(), "program");
        // Tree should have an error node but still parse
        assert!(root.has_error());
    }

    #[test]
    fn test_reparse_replaces_source() {
        let mut parser = FileParser::new();
        parser.parse_full("<?php\nclass Foo {}\n");
        parser.parse_full("<?php\nclass Bar {}\n");

        assert!(parser.source().contains("class Bar {}"));
        let tree = parser.tree().expect("Should have a tree after reparse");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_empty_php() {
        let mut parser = FileParser::new();
        parser.parse_full("<?php\n");

        let tree = parser.tree().expect("Should have a tree");
        assert!(!tree.root_node().has_error());
    }
}
