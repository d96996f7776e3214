//! Analysis configuration.
//!
//! Framework names the analyses look for. The defaults match the Symfony
//! form component; a JSON file can override any of them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a [`FormConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    /// Parent chain hops followed before giving up.
    pub max_depth: usize,
    /// Option configuration methods, oldest framework API first.
    pub option_methods: Vec<String>,
    /// Methods writing view variables.
    pub view_methods: Vec<String>,
    /// Functions merging an array into the view variables.
    pub view_merge_functions: Vec<String>,
    pub form_type_interface: String,
    pub form_extension_interface: String,
    /// Root form type every type inherits from.
    pub core_form_type: String,
    /// Alias of the root form type.
    pub core_form_alias: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            max_depth: 10,
            option_methods: vec!["setDefaultOptions".into(), "configureOptions".into()],
            view_methods: vec!["finishView".into(), "buildView".into()],
            view_merge_functions: vec!["array_replace".into(), "array_merge".into()],
            form_type_interface: "Symfony\\Component\\Form\\FormTypeInterface".into(),
            form_extension_interface: "Symfony\\Component\\Form\\FormTypeExtensionInterface"
                .into(),
            core_form_type: "Symfony\\Component\\Form\\Extension\\Core\\Type\\FormType".into(),
            core_form_alias: "form".into(),
        }
    }
}

impl FormConfig {
    /// Parse a JSON configuration. Missing fields keep their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}
