use thiserror::Error;

/// Errors reported by the command line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Index(#[from] formscope_index::Error),

    #[error(transparent)]
    Config(#[from] formscope_form::ConfigError),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
