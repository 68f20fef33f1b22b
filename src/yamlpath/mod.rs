//! Paths into a YAML tree.
//!
//! A [`Path`] is a list of [`Step`]s, each either a mapping key or a
//! sequence index. Paths are usually built with the [`path!`](crate::path)
//! macro, or parsed from text with [`Parser`].
//!
//! # Supported Syntax
//!
//! - `$` - Optional root marker
//! - `name` or `.name` - Mapping key
//! - `['name']` or `["name"]` - Mapping key with any characters
//! - `[index]` or `.[index]` - Sequence index
//!
//! # Examples
//!
//! ```
//! use yamlgraft::path;
//! use yamlgraft::yamlpath::Parser;
//!
//! assert_eq!(Parser::parse("$.spec.ports[0]").unwrap(), path!["spec", "ports", 0]);
//! assert_eq!(Parser::parse("metadata['app.kubernetes.io/name']").unwrap().len(), 2);
//! ```

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::{validate_steps, Path, Step};
pub use error::YamlPathError;
pub use parser::Parser;
