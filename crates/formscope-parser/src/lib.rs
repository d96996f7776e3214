//! PHP and Twig parsing for formscope.
//!
//! Wraps tree-sitter-php, lowers method bodies into the shared expression
//! tree, extracts the class model of a file, recovers literal string values
//! from expressions and parses Twig tags.

pub mod classes;
pub mod literals;
pub mod lower;
pub mod names;
pub mod parser;
pub mod twig;
