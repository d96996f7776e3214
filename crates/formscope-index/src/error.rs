//! Errors raised while loading project configuration.

use thiserror::Error;

/// Errors that can occur while reading container dumps and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error during read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// XML parsing error.
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
