//! Editing handle for a whole YAML document.
//!
//! A `Document` owns the document node and forwards every operation to a
//! [`Node`] around the document's root value. The root wrapper is rebuilt on
//! each call, so replacing the root never leaves a stale handle behind.
//!
//! # Example
//!
//! ```
//! use yamlgraft::{path, Document};
//!
//! let doc = Document::parse("foo:\n  bar: [a, b]\n").unwrap();
//! assert_eq!(doc.must_get(&path!["foo", "bar", 1]).to_string(), "b");
//!
//! doc.delete_key(&path!["foo", "bar", 0]).unwrap();
//! let out = String::from_utf8(doc.bytes(2).unwrap()).unwrap();
//! assert_eq!(out, "foo:\n  bar: [b]\n");
//! ```

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use super::key::KeyNode;
use super::node::Node;
use crate::document::encoder::{to_bytes, Encoder};
use crate::document::node::{null_node, NodeKind, NodeRef};
use crate::document::parser::{parse_yaml, parse_yaml_documents, Decoder};
use crate::error::{Error, Result};
use crate::yamlpath::Step;

#[derive(Debug, Clone)]
pub struct Document {
    node: NodeRef,
}

impl Document {
    /// Wraps a node of kind `Document`.
    pub fn new(node: NodeRef) -> Result<Self> {
        let kind = node.borrow().kind;
        if kind != NodeKind::Document {
            return Err(Error::InvalidArgument(format!(
                "expected a document node, got a {}",
                kind
            )));
        }
        Ok(Self { node })
    }

    /// Decodes the first document of `input`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::new(parse_yaml(input)?)
    }

    /// Decodes every document of a multi-document stream.
    pub fn parse_all(input: &str) -> Result<Vec<Self>> {
        parse_yaml_documents(input)?
            .into_iter()
            .map(Self::new)
            .collect()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let node = Decoder::new(reader)
            .decode()?
            .ok_or_else(|| Error::InvalidArgument("input contains no YAML document".to_string()))?;
        Self::new(node)
    }

    /// The document node itself.
    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }

    /// A fresh wrapper around the document's root value.
    pub fn root(&self) -> Result<Node> {
        let content = self.node.borrow().content.first().cloned();
        match content {
            Some(content) => Node::new(content),
            None => Err(Error::InvalidArgument(
                "document has no content node".to_string(),
            )),
        }
    }

    /// Encodes the document with `indent` spaces per level.
    pub fn bytes(&self, indent: usize) -> Result<Vec<u8>> {
        to_bytes(&self.node, indent)
    }

    pub fn encode<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.encode(&self.node)
    }

    pub fn get(&self, steps: &[Step]) -> Option<Node> {
        self.root().ok()?.get(steps)
    }

    pub fn lookup(&self, steps: &[Step]) -> Result<Node> {
        self.root()?.lookup(steps)
    }

    pub fn must_get(&self, steps: &[Step]) -> Node {
        match self.root() {
            Ok(root) => root.must_get(steps),
            Err(_) => Node::wrap(null_node()),
        }
    }

    pub fn get_key(&self, steps: &[Step]) -> Option<KeyNode> {
        self.root().ok()?.get_key(steps)
    }

    pub fn set<V: Serialize + ?Sized>(&self, value: &V) -> Result<()> {
        self.root()?.set(value)
    }

    pub fn replace<V: Serialize + ?Sized>(&self, value: &V) -> Result<()> {
        self.root()?.replace(value)
    }

    pub fn set_key<V: Serialize + ?Sized>(&self, key: impl Into<Step>, value: &V) -> Result<Node> {
        self.root()?.set_key(key, value)
    }

    pub fn replace_key<V: Serialize + ?Sized>(
        &self,
        key: impl Into<Step>,
        value: &V,
    ) -> Result<Node> {
        self.root()?.replace_key(key, value)
    }

    pub fn set_at<V: Serialize + ?Sized>(&self, steps: &[Step], value: &V) -> Result<Node> {
        self.root()?.set_at(steps, value)
    }

    pub fn replace_at<V: Serialize + ?Sized>(&self, steps: &[Step], value: &V) -> Result<Node> {
        self.root()?.replace_at(steps, value)
    }

    pub fn delete_key(&self, steps: &[Step]) -> Result<()> {
        self.root()?.delete_key(steps)
    }

    pub fn to<T: DeserializeOwned>(&self) -> Result<T> {
        self.root()?.to()
    }

    // Comments of the root value.

    pub fn head_comment(&self) -> String {
        self.root().map(|r| r.head_comment()).unwrap_or_default()
    }

    pub fn line_comment(&self) -> String {
        self.root().map(|r| r.line_comment()).unwrap_or_default()
    }

    pub fn foot_comment(&self) -> String {
        self.root().map(|r| r.foot_comment()).unwrap_or_default()
    }

    pub fn set_head_comment(&self, comment: impl Into<String>) -> &Self {
        if let Ok(root) = self.root() {
            root.set_head_comment(comment);
        }
        self
    }

    pub fn set_line_comment(&self, comment: impl Into<String>) -> &Self {
        if let Ok(root) = self.root() {
            root.set_line_comment(comment);
        }
        self
    }

    pub fn set_foot_comment(&self, comment: impl Into<String>) -> &Self {
        if let Ok(root) = self.root() {
            root.set_foot_comment(comment);
        }
        self
    }

    // Comments of the document itself, written above and below everything
    // else.

    pub fn document_head_comment(&self) -> String {
        self.node.borrow().head_comment.clone()
    }

    pub fn document_foot_comment(&self) -> String {
        self.node.borrow().foot_comment.clone()
    }

    pub fn set_document_head_comment(&self, comment: impl Into<String>) -> &Self {
        self.node.borrow_mut().head_comment = comment.into();
        self
    }

    pub fn set_document_foot_comment(&self, comment: impl Into<String>) -> &Self {
        self.node.borrow_mut().foot_comment = comment.into();
        self
    }
}

/// Documents are written with [`Document::bytes`] or [`Document::encode`],
/// which keep comments. Handing one to a serde serializer is a programming
/// error.
impl Serialize for Document {
    fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
        panic!("yamlgraft::Document must not be serialized directly, use bytes() or encode() instead")
    }
}
