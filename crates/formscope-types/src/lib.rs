//! Shared types for formscope.
//!
//! Contains the lowered expression tree, the PHP class model, form option
//! records and Twig template records used across the parser, index and
//! form analysis crates.

pub mod class;
pub mod expr;
pub mod form;
pub mod twig;

pub use class::{ClassKind, PhpClass, PhpMethod};
pub use expr::{ArrayElement, Call, Callee, Expr, ExprKind, Range};
pub use form::{FormClassRef, FormClassRole, FormOption, OptionKind, SourceLocation};
pub use twig::{NamespaceType, TwigBlock, TwigPath};
