//! Loading a project from disk.

use crate::error::{CliError, Result};
use formscope_form::{FormAnalyzer, FormConfig};
use formscope_index::{ContainerServices, ProjectIndex, ServiceRegistry, StaticServices};
use formscope_parser::classes::parse_classes;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never scanned for PHP sources.
const SKIPPED_DIRS: &[&str] = &["node_modules", "var"];

/// An indexed project with its service registrations and configuration.
pub struct Project {
    root: PathBuf,
    index: ProjectIndex,
    services: Box<dyn ServiceRegistry>,
    config: FormConfig,
}

impl Project {
    /// Index every PHP file under `root`.
    pub fn load(root: &Path, config: Option<&Path>, container: Option<&Path>) -> Result<Self> {
        if !root.is_dir() {
            return Err(CliError::NotADirectory(root.display().to_string()));
        }

        let config = match config {
            Some(path) => FormConfig::from_file(path)?,
            None => FormConfig::default(),
        };

        let services: Box<dyn ServiceRegistry> = match container {
            Some(path) => Box::new(ContainerServices::from_file(path)?),
            None => Box::new(StaticServices::new()),
        };

        let index = ProjectIndex::new();
        let files = index_directory(&index, root);
        tracing::info!(
            "Indexed {} classes from {} PHP files under {}",
            index.len(),
            files,
            root.display()
        );

        Ok(Project {
            root: root.to_path_buf(),
            index,
            services,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn analyzer(&self) -> FormAnalyzer<'_> {
        FormAnalyzer::new(&self.index, self.services.as_ref(), &self.config)
    }
}

/// Parse the PHP files under `root` into `index`. Returns the number of
/// files read.
pub fn index_directory(index: &ProjectIndex, root: &Path) -> usize {
    let mut files = 0;
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("php")
        {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(source) => {
                let uri = path_to_uri(path);
                index.update_file(&uri, parse_classes(&source, &uri));
                files += 1;
            }
            Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
        }
    }
    files
}

fn is_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Convert a file path to a file:// URI.
pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Read a file, attaching its path to the error.
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use formscope_index::ClassIndex;
    use std::fs;

    #[test]
    fn test_index_directory_skips_hidden_and_cache_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/Form")).unwrap();
        fs::create_dir_all(root.join("var/cache")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(
            root.join("src/Form/UserType.php"),
            "<?php\nnamespace App\\Form;\nclass UserType {}\n",
        )
        .unwrap();
        fs::write(
            root.join("var/cache/Cached.php"),
            "<?php\nnamespace Cache;\nclass Cached {}\n",
        )
        .unwrap();
        fs::write(root.join(".git/Hidden.php"), "<?php\nclass Hidden {}\n").unwrap();
        fs::write(root.join("src/Form/notes.txt"), "class NotPhp {}").unwrap();

        let index = ProjectIndex::new();
        assert_eq!(index_directory(&index, root), 1);
        assert!(index.get_class("App\\Form\\UserType").is_some());
        assert!(index.get_class("Cache\\Cached").is_none());
        assert!(index.get_class("Hidden").is_none());
    }

    #[test]
    fn test_load_rejects_missing_directory() {
        let result = Project::load(Path::new("/nonexistent/project"), None, None);
        assert!(matches!(result, Err(CliError::NotADirectory(_))));
    }

    #[test]
    fn test_load_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("formscope.json");
        fs::write(&config, "{ not json").unwrap();
        let result = Project::load(dir.path(), Some(&config), None);
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
