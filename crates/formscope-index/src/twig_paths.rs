//! Twig template path configuration.
//!
//! Reads the `twig.paths` section of a framework config file and
//! deduplicates template roots.

use crate::error::Result;
use formscope_types::TwigPath;
use serde_yaml::Value;
use std::collections::HashSet;

/// `(namespace, path)` pairs of the `twig.paths` mapping.
///
/// A `~` or empty value maps the directory into the main namespace `""`.
/// A plain list of directories is accepted too, all in the main namespace.
pub fn twig_paths_from_yaml(content: &str) -> Result<Vec<(String, String)>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_yaml::from_str(content)?;
    let Some(paths) = value.get("twig").and_then(|twig| twig.get("paths")) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    match paths {
        Value::Mapping(mapping) => {
            for (path, namespace) in mapping {
                let Some(path) = scalar_text(path) else {
                    continue;
                };
                let namespace = scalar_text(namespace).unwrap_or_default();
                out.push((namespace.trim().to_string(), normalize_path(&path)));
            }
        }
        Value::Sequence(sequence) => {
            for path in sequence.iter().filter_map(scalar_text) {
                out.push((String::new(), normalize_path(&path)));
            }
        }
        _ => tracing::debug!("twig.paths is neither a mapping nor a list"),
    }
    Ok(out)
}

/// Template roots of a config file, deduplicated.
pub fn twig_paths(content: &str) -> Result<Vec<TwigPath>> {
    let pairs = twig_paths_from_yaml(content)?;
    Ok(unique_twig_paths(
        pairs
            .into_iter()
            .map(|(namespace, path)| TwigPath::new(path, namespace)),
    ))
}

/// Drop template roots whose normalized path and namespace type were
/// already seen. The first entry wins.
pub fn unique_twig_paths(paths: impl IntoIterator<Item = TwigPath>) -> Vec<TwigPath> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.unique_key()))
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `\` → `/`, runs of `/` collapsed.
fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.trim().chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
