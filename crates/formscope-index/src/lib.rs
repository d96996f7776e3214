//! Project index for formscope.
//!
//! Provides the class index the form analyses resolve names against, the
//! service registrations read from a compiled container dump, and the
//! Twig template path configuration.

pub mod container;
pub mod error;
pub mod twig_paths;
pub mod workspace;

pub use container::{ContainerServices, ServiceRegistry, StaticServices};
pub use error::{Error, Result};
pub use workspace::{ClassIndex, ProjectIndex};
