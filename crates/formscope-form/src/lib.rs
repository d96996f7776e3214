//! Form analysis for formscope.
//!
//! Computes the effective options of a form type (its own, its parents'
//! and those of every extension registered against it), the view
//! variables form types expose to templates, and the lookup and
//! navigation queries built on top of them.

pub mod config;
pub mod context;
pub mod extensions;
pub mod hierarchy;
pub mod options;
pub mod query;
pub mod types;
pub mod view_vars;

pub use config::{ConfigError, FormConfig};
pub use context::AnalysisContext;
pub use options::{FormOptionMap, FormOptionVisitor, OptionSource};
pub use query::{FormAnalyzer, OptionLookup};
pub use types::FormTypeCollector;

#[cfg(test)]
pub(crate) mod test_support;
