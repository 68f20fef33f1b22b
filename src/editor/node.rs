//! Path-addressed reads and writes on a YAML node.
//!
//! `Node` is a thin, cheaply clonable handle around a tree node. Every
//! operation takes a list of steps (or a [`Path`], which dereferences to
//! one) and walks down from the wrapped node, building child wrappers on the
//! fly.
//!
//! Writes come in two flavours:
//!
//! - `set*` refuse to change a node's kind (a scalar into a mapping, ...),
//!   except that nulls can become, or be replaced by, anything.
//! - `replace*` overwrite whatever is there.
//!
//! Writing below a missing key creates the containers on the way down: a
//! mapping when the next step is a key, a sequence when it is an index.
//! Sequences are padded with nulls up to the written index.
//!
//! # Example
//!
//! ```
//! use yamlgraft::{path, Node};
//!
//! let node = Node::from_reader("list: [1, 2]\n".as_bytes()).unwrap();
//! node.set_at(&path!["list", 4], "x").unwrap();
//!
//! let out = String::from_utf8(node.bytes(2).unwrap()).unwrap();
//! assert_eq!(out, "list: [1, 2, null, null, x]\n");
//! ```

use std::fmt;
use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::construct::{compatible_kinds, create_fitting_empty_node, create_node, deep_copy};
use super::key::KeyNode;
use crate::document::encoder::{to_bytes, Encoder};
use crate::document::node::{null_node, string_node, NodeKind, NodeRef, Style};
use crate::document::parser::Decoder;
use crate::error::{Error, NotFoundCause, Result};
use crate::yamlpath::ast::validate_steps;
use crate::yamlpath::{Path, Step};

/// Editing handle around a non-document node.
#[derive(Debug, Clone)]
pub struct Node {
    node: NodeRef,
}

impl Node {
    /// Wraps `node`. Document nodes must go through `Document` instead.
    pub fn new(node: NodeRef) -> Result<Self> {
        if node.borrow().kind == NodeKind::Document {
            return Err(Error::InvalidArgument(
                "cannot wrap a document node, use Document instead".to_string(),
            ));
        }
        Ok(Self { node })
    }

    /// Decodes the first document from `reader` and wraps its root value.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let doc = Decoder::new(reader)
            .decode()?
            .ok_or_else(|| Error::InvalidArgument("input contains no YAML document".to_string()))?;
        let root = doc.borrow().content.first().cloned();
        match root {
            Some(root) => Self::new(root),
            None => Err(Error::InvalidArgument(
                "document has no content node".to_string(),
            )),
        }
    }

    /// Wraps a node already known to be a document's descendant.
    pub(crate) fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    /// The underlying tree node.
    pub fn raw(&self) -> NodeRef {
        self.node.clone()
    }

    pub fn kind(&self) -> NodeKind {
        self.node.borrow().kind
    }

    pub fn style(&self) -> Style {
        self.node.borrow().style
    }

    pub fn tag(&self) -> String {
        self.node.borrow().tag.clone()
    }

    pub fn anchor(&self) -> String {
        self.node.borrow().anchor.clone()
    }

    /// Encodes this node as a standalone YAML document.
    pub fn bytes(&self, indent: usize) -> Result<Vec<u8>> {
        to_bytes(&self.node, indent)
    }

    pub fn encode<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.encode(&self.node)
    }

    // ==================== Reading ====================

    fn step(&self, step: &Step) -> std::result::Result<Node, NotFoundCause> {
        let node = self.node.borrow();
        match step {
            Step::Key(key) => {
                if node.kind != NodeKind::Mapping {
                    return Err(NotFoundCause::NotAMapping);
                }
                node.mapping_value(key)
                    .map(Node::wrap)
                    .ok_or(NotFoundCause::StepNotFound)
            }
            Step::Index(idx) => {
                if node.kind != NodeKind::Sequence {
                    return Err(NotFoundCause::NotASequence);
                }
                usize::try_from(*idx)
                    .ok()
                    .and_then(|i| node.content.get(i).cloned())
                    .map(Node::wrap)
                    .ok_or(NotFoundCause::StepNotFound)
            }
        }
    }

    /// Follows `steps` and reports exactly where the walk stopped when it
    /// cannot reach the end.
    pub fn lookup(&self, steps: &[Step]) -> Result<Node> {
        if steps.is_empty() {
            return Err(Error::InvalidArgument("path cannot be empty".to_string()));
        }
        let mut current = self.clone();
        for (i, step) in steps.iter().enumerate() {
            current = current.step(step).map_err(|cause| Error::NotFound {
                path: Path::from(&steps[..=i]),
                cause,
            })?;
        }
        Ok(current)
    }

    /// Returns the node at `steps`, or `None` if any step cannot be followed.
    pub fn get(&self, steps: &[Step]) -> Option<Node> {
        self.lookup(steps).ok()
    }

    /// Like `get`, but yields a detached null node when nothing is found.
    pub fn must_get(&self, steps: &[Step]) -> Node {
        self.get(steps).unwrap_or_else(|| Node::wrap(null_node()))
    }

    /// Returns the key of the mapping entry addressed by `steps`.
    pub fn get_key(&self, steps: &[Step]) -> Option<KeyNode> {
        let (last, parents) = steps.split_last()?;
        let Step::Key(key) = last else {
            return None;
        };
        let parent = if parents.is_empty() {
            self.clone()
        } else {
            self.get(parents)?
        };
        let node = parent.node.borrow();
        if node.kind != NodeKind::Mapping {
            return None;
        }
        node.key_position(key)
            .map(|idx| KeyNode::new(node.content[idx].clone()))
    }

    // ==================== Writing ====================

    /// Overwrites this node with `value`, keeping its kind.
    pub fn set<V: Serialize + ?Sized>(&self, value: &V) -> Result<()> {
        self.overwrite(create_node(value)?, true)
    }

    /// Overwrites this node with `value`, whatever its kind.
    pub fn replace<V: Serialize + ?Sized>(&self, value: &V) -> Result<()> {
        self.overwrite(create_node(value)?, false)
    }

    pub fn set_key<V: Serialize + ?Sized>(&self, key: impl Into<Step>, value: &V) -> Result<Node> {
        self.write_key(key.into(), value, true)
    }

    pub fn replace_key<V: Serialize + ?Sized>(
        &self,
        key: impl Into<Step>,
        value: &V,
    ) -> Result<Node> {
        self.write_key(key.into(), value, false)
    }

    /// Writes `value` at `steps`, creating missing containers on the way.
    pub fn set_at<V: Serialize + ?Sized>(&self, steps: &[Step], value: &V) -> Result<Node> {
        self.write_at(steps, value, true)
    }

    pub fn replace_at<V: Serialize + ?Sized>(&self, steps: &[Step], value: &V) -> Result<Node> {
        self.write_at(steps, value, false)
    }

    fn overwrite(&self, new: NodeRef, forbid_kind_change: bool) -> Result<()> {
        if forbid_kind_change {
            let existing = self.node.borrow();
            let incoming = new.borrow();
            if !compatible_kinds(&existing, &incoming) {
                return Err(Error::IncompatibleKind {
                    path: Path::new(),
                    existing: existing.kind,
                    requested: incoming.kind,
                });
            }
        }
        deep_copy(&self.node, &new);
        Ok(())
    }

    fn write_key<V: Serialize + ?Sized>(
        &self,
        key: Step,
        value: &V,
        forbid_kind_change: bool,
    ) -> Result<Node> {
        validate_steps(std::slice::from_ref(&key))?;
        let node = create_node(value)?;
        self.set_key_node(&key, node.clone(), forbid_kind_change)
            .map_err(|e| e.at(&key))?;
        Ok(Node::wrap(node))
    }

    fn write_at<V: Serialize + ?Sized>(
        &self,
        steps: &[Step],
        value: &V,
        forbid_kind_change: bool,
    ) -> Result<Node> {
        if steps.is_empty() {
            return Err(Error::InvalidArgument("path cannot be empty".to_string()));
        }
        validate_steps(steps)?;
        let node = create_node(value)?;
        self.set_at_node(steps, node, forbid_kind_change)
    }

    fn set_at_node(&self, steps: &[Step], value: NodeRef, forbid_kind_change: bool) -> Result<Node> {
        let Some((head, tail)) = steps.split_first() else {
            return Err(Error::InvalidArgument("path cannot be empty".to_string()));
        };

        self.ensure_container_for(head, forbid_kind_change)?;

        if tail.is_empty() {
            self.set_key_node(head, value.clone(), forbid_kind_change)
                .map_err(|e| e.at(head))?;
            return Ok(Node::wrap(value));
        }

        let child = match self.step(head) {
            Ok(child) => child,
            Err(_) => self.insert_container(head, tail)?,
        };

        child
            .set_at_node(tail, value, forbid_kind_change)
            .map_err(|e| e.at(head))
    }

    /// Turns this node into an empty container `head` can be applied to,
    /// unless it already is one. Only nulls are converted when kind changes
    /// are forbidden.
    fn ensure_container_for(&self, head: &Step, forbid_kind_change: bool) -> Result<()> {
        let (existing, is_null) = {
            let node = self.node.borrow();
            (node.kind, node.is_null())
        };
        let fits = matches!(
            (existing, head),
            (NodeKind::Mapping, Step::Key(_)) | (NodeKind::Sequence, Step::Index(_))
        );
        if fits {
            return Ok(());
        }

        let fitting = create_fitting_empty_node(Some(head));
        let requested = fitting.borrow().kind;
        if forbid_kind_change && !is_null {
            return Err(Error::IncompatibleKind {
                path: Path::from(head.clone()),
                existing,
                requested,
            });
        }
        debug!(from = %existing, step = %head, "coercing node into a container");
        deep_copy(&self.node, &fitting);
        Ok(())
    }

    /// Adds an empty container under `head` that fits the first step of `tail`.
    fn insert_container(&self, head: &Step, tail: &[Step]) -> Result<Node> {
        let container = create_fitting_empty_node(tail.first());
        debug!(step = %head, kind = %container.borrow().kind, "creating missing container");
        self.set_key_node(head, container.clone(), false)?;
        Ok(Node::wrap(container))
    }

    /// Stores `value` in the child slot named by `key`.
    ///
    /// Missing mapping keys are appended, sequences are padded with nulls.
    fn set_key_node(&self, key: &Step, value: NodeRef, forbid_kind_change: bool) -> Result<()> {
        let mut node = self.node.borrow_mut();
        let slot = match (node.kind, key) {
            (NodeKind::Mapping, Step::Key(name)) => match node.key_position(name) {
                Some(pos) if pos + 1 < node.content.len() => pos + 1,
                Some(_) => {
                    return Err(Error::InvalidArgument(format!(
                        "key {} has no value node",
                        name
                    )))
                }
                None => {
                    node.content.push(string_node(name.as_str()));
                    node.content.push(value);
                    return Ok(());
                }
            },
            (NodeKind::Sequence, Step::Index(idx)) => {
                let idx = usize::try_from(*idx).map_err(|_| {
                    Error::InvalidPath(vec![format!("{} is invalid, steps must be >= 0", idx)])
                })?;
                while node.content.len() <= idx {
                    node.content.push(null_node());
                }
                idx
            }
            (kind @ (NodeKind::Mapping | NodeKind::Sequence), step) => {
                return Err(Error::InvalidArgument(format!(
                    "cannot use {} step {} on a {}",
                    step.type_name(),
                    step,
                    kind
                )))
            }
            (kind, _) => {
                return Err(Error::InvalidArgument(format!(
                    "node is a {}, not a sequence or mapping",
                    kind
                )))
            }
        };

        if forbid_kind_change {
            let conflict = {
                let existing = node.content[slot].borrow();
                let incoming = value.borrow();
                (!compatible_kinds(&existing, &incoming)).then(|| (existing.kind, incoming.kind))
            };
            if let Some((existing, requested)) = conflict {
                return Err(Error::IncompatibleKind {
                    path: Path::new(),
                    existing,
                    requested,
                });
            }
        }
        node.content[slot] = value;
        Ok(())
    }

    // ==================== Deleting ====================

    /// Removes the entry addressed by `steps`.
    ///
    /// Deleting something that does not exist is not an error. Aliases
    /// elsewhere in the document that refer to an anchor inside the removed
    /// entry are left in place and no longer resolve; a warning names those
    /// anchors.
    pub fn delete_key(&self, steps: &[Step]) -> Result<()> {
        let Some((last, parents)) = steps.split_last() else {
            return Err(Error::InvalidArgument("path cannot be empty".to_string()));
        };
        validate_steps(steps)?;
        let parent = if parents.is_empty() {
            self.clone()
        } else {
            match self.get(parents) {
                Some(parent) => parent,
                None => return Ok(()),
            }
        };

        let removed: Vec<NodeRef> = {
            let mut node = parent.node.borrow_mut();
            let removed = match (node.kind, last) {
                (NodeKind::Mapping, Step::Key(name)) => match node.key_position(name) {
                    Some(pos) => {
                        let end = (pos + 2).min(node.content.len());
                        debug!(key = %name, "deleted mapping entry");
                        node.content.drain(pos..end).collect()
                    }
                    None => Vec::new(),
                },
                (NodeKind::Sequence, Step::Index(idx)) => {
                    match usize::try_from(*idx).ok().filter(|&i| i < node.content.len()) {
                        Some(i) => {
                            debug!(index = i, "deleted sequence item");
                            vec![node.content.remove(i)]
                        }
                        None => Vec::new(),
                    }
                }
                _ => Vec::new(),
            };
            removed
        };

        let mut anchors = Vec::new();
        for node in &removed {
            collect_anchors(node, &mut anchors);
        }
        if !anchors.is_empty() {
            warn!(
                anchors = %anchors.join(", "),
                "deleted entry defined anchors, aliases to them no longer resolve"
            );
        }
        Ok(())
    }

    // ==================== Comments ====================

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

    // ==================== Conversions ====================

    /// Decodes the node into any deserializable type.
    pub fn to<T: DeserializeOwned>(&self) -> Result<T> {
        let value = serde_yaml::to_value(&*self.node.borrow())?;
        Ok(serde_yaml::from_value(value)?)
    }

    /// The node as an integer, or 0.
    pub fn to_int(&self) -> i64 {
        if self.kind() != NodeKind::Scalar {
            return 0;
        }
        self.to().unwrap_or(0)
    }

    /// The node's items, or an empty list when it is not a sequence.
    pub fn to_slice(&self) -> Vec<serde_yaml::Value> {
        if self.kind() != NodeKind::Sequence {
            return Vec::new();
        }
        self.to().unwrap_or_default()
    }

    /// The node's entries, or an empty map when it is not a mapping with
    /// string keys.
    pub fn to_map(&self) -> IndexMap<String, serde_yaml::Value> {
        if self.kind() != NodeKind::Mapping {
            return IndexMap::new();
        }
        self.to().unwrap_or_default()
    }
}

/// Renders the scalar text; non-scalars and nulls render as "".
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        if node.kind == NodeKind::Scalar && !node.is_null() {
            f.write_str(&node.value)
        } else {
            Ok(())
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.node.borrow().serialize(serializer)
    }
}

/// Anchor names defined in the subtree under `node`. Aliases are not
/// followed.
fn collect_anchors(node: &NodeRef, out: &mut Vec<String>) {
    let node = node.borrow();
    if !node.anchor.is_empty() {
        out.push(node.anchor.clone());
    }
    if node.kind != NodeKind::Alias {
        for child in &node.content {
            collect_anchors(child, out);
        }
    }
}
