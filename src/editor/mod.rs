//! Editing handles over the decoded tree.
//!
//! # Modules
//!
//! - `construct`: building detached nodes from Rust values
//! - `node`: path-addressed reads and writes on any node
//! - `key`: comment access for mapping keys
//! - `document`: the same surface on a whole document

pub mod construct;
pub mod document;
pub mod key;
pub mod node;

pub use construct::{create_fitting_empty_node, create_node};
pub use document::Document;
pub use key::KeyNode;
pub use node::Node;
