//! Command line front end for formscope.
//!
//! Indexes a project directory and prints the result of a form or Twig
//! query as pretty JSON.

pub mod cli;
pub mod error;
pub mod project;
pub mod report;

pub use cli::{run, Cli, Commands};
pub use error::{CliError, Result};
pub use project::Project;
