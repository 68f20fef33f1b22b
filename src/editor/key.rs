//! Comment access for mapping keys.

use std::fmt;

use crate::document::node::NodeRef;

/// View of the key node of a mapping entry.
///
/// Comments written above or beside a `key: value` line belong to the key, so
/// this is where they are read and changed.
///
/// ```
/// use yamlgraft::{path, Document};
///
/// let doc = Document::parse("name: demo # the name\n").unwrap();
/// let key = doc.get_key(&path!["name"]).unwrap();
/// assert_eq!(key.to_string(), "name");
///
/// key.set_head_comment("identification");
/// let out = String::from_utf8(doc.bytes(2).unwrap()).unwrap();
/// assert_eq!(out, "# identification\nname: demo # the name\n");
/// ```
#[derive(Debug, Clone)]
pub struct KeyNode {
    node: NodeRef,
}

impl KeyNode {
    pub(crate) fn new(node: NodeRef) -> Self {
        Self { node }
    }

    pub fn raw(&self) -> NodeRef {
        self.node.clone()
    }

    pub fn head_comment(&self) -> String {
        self.node.borrow().head_comment.clone()
    }

    pub fn line_comment(&self) -> String {
        self.node.borrow().line_comment.clone()
    }

    pub fn foot_comment(&self) -> String {
        self.node.borrow().foot_comment.clone()
    }

    pub fn set_head_comment(&self, comment: impl Into<String>) -> &Self {
        self.node.borrow_mut().head_comment = comment.into();
        self
    }

    pub fn set_line_comment(&self, comment: impl Into<String>) -> &Self {
        self.node.borrow_mut().line_comment = comment.into();
        self
    }

    pub fn set_foot_comment(&self, comment: impl Into<String>) -> &Self {
        self.node.borrow_mut().foot_comment = comment.into();
        self
    }
}

impl fmt::Display for KeyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.borrow().value)
    }
}
