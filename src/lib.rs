//! yamlgraft: comment-preserving, path-addressed editing of YAML documents.
//!
//! Documents are decoded into a tree that keeps comments, styles, tags and
//! anchors. [`Document`] and [`Node`] read, write and delete values at
//! nested paths without disturbing the rest of the decoration, and the tree
//! encodes back to YAML.
//!
//! ```
//! use yamlgraft::{path, Document};
//!
//! let doc = Document::parse("# settings\n\nserver:\n  port: 80 # default\n").unwrap();
//! doc.set_at(&path!["server", "port"], &8080).unwrap();
//! doc.set_at(&path!["server", "hosts", 0], "example.com").unwrap();
//!
//! let out = String::from_utf8(doc.bytes(2).unwrap()).unwrap();
//! assert_eq!(
//!     out,
//!     "# settings\n\nserver:\n  port: 8080\n  hosts:\n    - example.com\n"
//! );
//! ```

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod file;
pub mod yamlpath;

pub use editor::{create_fitting_empty_node, create_node, Document, KeyNode, Node};
pub use error::{Error, NotFoundCause, Result};
pub use yamlpath::{Path, Step};
