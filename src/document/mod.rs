//! YAML document model: node tree, decoding and encoding.
//!
//! # Modules
//!
//! - `node`: the comment-carrying tree (`YamlNode`, `NodeRef`)
//! - `parser`: text to tree, including comment placement
//! - `encoder`: tree to text
//! - `value`: tree to serde data

pub mod encoder;
pub mod node;
pub mod parser;
pub mod value;

pub use encoder::{to_bytes, Encoder};
pub use node::{NodeKind, NodeRef, Style, YamlNode};
pub use parser::{parse_yaml, parse_yaml_documents, Decoder};
