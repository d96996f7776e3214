//! Twig template records.

use crate::expr::Range;
use serde::{Deserialize, Serialize};

/// How a template directory's namespace was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NamespaceType {
    /// Plain `@Namespace/...` path (or the main namespace when empty).
    #[default]
    Add,
    /// `Bundle:Controller:template` shortcut syntax.
    Bundle,
}

/// A template root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwigPath {
    pub path: String,
    pub namespace: String,
    #[serde(default)]
    pub namespace_type: NamespaceType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TwigPath {
    pub fn new(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        TwigPath {
            path: path.into(),
            namespace: namespace.into(),
            namespace_type: NamespaceType::Add,
            enabled: true,
        }
    }

    pub fn with_type(mut self, namespace_type: NamespaceType) -> Self {
        self.namespace_type = namespace_type;
        self
    }

    /// Path with `\` turned into `/` and trailing separators removed.
    pub fn normalized_path(&self) -> String {
        let path = self.path.replace('\\', "/");
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() && !path.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Two paths are the same template root when this key matches.
    pub fn unique_key(&self) -> (String, NamespaceType) {
        (self.normalized_path(), self.namespace_type)
    }
}

/// A `{% block %}` declared in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwigBlock {
    pub name: String,
    pub uri: String,
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_path() {
        assert_eq!(TwigPath::new("path/", "path").normalized_path(), "path");
        assert_eq!(TwigPath::new("path\\", "path").normalized_path(), "path");
        assert_eq!(TwigPath::new("a\\b//", "").normalized_path(), "a/b");
        assert_eq!(TwigPath::new("/", "").normalized_path(), "/");
    }

    #[test]
    fn test_unique_key_includes_namespace_type() {
        let plain = TwigPath::new("path", "path");
        let bundle = TwigPath::new("path", "path").with_type(NamespaceType::Bundle);
        assert_ne!(plain.unique_key(), bundle.unique_key());
        assert_eq!(
            TwigPath::new("path/", "x").unique_key(),
            TwigPath::new("path\\", "y").unique_key()
        );
    }
}
