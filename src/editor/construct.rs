//! Building nodes for writes.

use std::rc::Rc;

use serde::Serialize;

use crate::document::node::{mapping_node, null_node, sequence_node, NodeKind, NodeRef, YamlNode};
use crate::document::parser::parse_yaml;
use crate::error::{Error, Result};
use crate::yamlpath::Step;

/// Turns any serializable value into a fresh, detached node.
///
/// The value is rendered to YAML with serde_yaml and decoded again, so the
/// new node carries the same tags and styles a parsed document would.
///
/// ```
/// use yamlgraft::create_node;
/// use yamlgraft::document::NodeKind;
///
/// let node = create_node(&vec![1, 2, 3]).unwrap();
/// assert_eq!(node.borrow().kind, NodeKind::Sequence);
/// assert_eq!(node.borrow().content.len(), 3);
/// ```
pub fn create_node<V: Serialize + ?Sized>(value: &V) -> Result<NodeRef> {
    let text = serde_yaml::to_string(value)?;
    let doc = parse_yaml(&text)?;
    let doc = doc.borrow();
    if doc.kind != NodeKind::Document {
        return Err(Error::InvalidArgument(format!(
            "decoding produced a {} instead of a document",
            doc.kind
        )));
    }
    doc.content
        .first()
        .cloned()
        .ok_or_else(|| Error::InvalidArgument("decoded document has no content".to_string()))
}

/// Creates the empty container a step can be applied to: a mapping for a
/// key, a sequence for an index and a null scalar when there is no step.
pub fn create_fitting_empty_node(step: Option<&Step>) -> NodeRef {
    match step {
        Some(Step::Key(_)) => mapping_node(),
        Some(Step::Index(_)) => sequence_node(),
        None => null_node(),
    }
}

/// Whether `new` may take the place of `existing` without a kind change.
///
/// Nulls are compatible with everything, in both directions.
pub fn compatible_kinds(existing: &YamlNode, new: &YamlNode) -> bool {
    existing.kind == new.kind || existing.is_null() || new.is_null()
}

/// Overwrites every field of `dst` with the fields of `src`, keeping the
/// identity of `dst`.
pub fn deep_copy(dst: &NodeRef, src: &NodeRef) {
    if Rc::ptr_eq(dst, src) {
        return;
    }
    let copy = src.borrow().clone();
    *dst.borrow_mut() = copy;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::{string_node, Style, NULL_TAG, STR_TAG};
    use std::collections::BTreeMap;

    #[test]
    fn test_create_node_from_scalars() {
        let node = create_node("hello").unwrap();
        assert_eq!(node.borrow().kind, NodeKind::Scalar);
        assert_eq!(node.borrow().value, "hello");

        let node = create_node(&Option::<u8>::None).unwrap();
        assert_eq!(node.borrow().tag, NULL_TAG);

        let node = create_node("true").unwrap();
        assert_eq!(node.borrow().tag, STR_TAG);
    }

    #[test]
    fn test_create_node_from_map_is_block_style() {
        let mut map = BTreeMap::new();
        map.insert("foo", 1);
        let node = create_node(&map).unwrap();
        let node = node.borrow();
        assert_eq!(node.kind, NodeKind::Mapping);
        assert_eq!(node.style, Style::Plain);
        assert_eq!(node.content[0].borrow().value, "foo");
    }

    #[test]
    fn test_fitting_empty_node_follows_step() {
        assert_eq!(
            create_fitting_empty_node(Some(&Step::from("a"))).borrow().kind,
            NodeKind::Mapping
        );
        assert_eq!(
            create_fitting_empty_node(Some(&Step::from(0))).borrow().kind,
            NodeKind::Sequence
        );
        assert!(create_fitting_empty_node(None).borrow().is_null());
    }

    #[test]
    fn test_null_is_compatible_with_everything() {
        let null = null_node();
        let map = mapping_node();
        let text = string_node("x");
        assert!(compatible_kinds(&null.borrow(), &map.borrow()));
        assert!(compatible_kinds(&map.borrow(), &null.borrow()));
        assert!(!compatible_kinds(&map.borrow(), &text.borrow()));
    }

    #[test]
    fn test_deep_copy_keeps_identity() {
        let dst = string_node("old");
        let alias = dst.clone();
        deep_copy(&dst, &mapping_node());
        assert_eq!(alias.borrow().kind, NodeKind::Mapping);
        deep_copy(&dst, &dst);
    }
}
