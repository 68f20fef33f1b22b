//! YAML node representation with decoration tracking.
//!
//! This module provides the tree that every other part of yamlgraft works on.
//! A `YamlNode` records not only the value it holds but everything needed to
//! write it back the way it was found: scalar and collection style, the
//! resolved tag, anchors, and the head/line/foot comments around it.
//!
//! Nodes are shared through `NodeRef` (`Rc<RefCell<YamlNode>>`). Overwriting a
//! node in place through one handle is visible through every other handle to
//! the same node, which is what lets editing wrappers be thrown away and
//! rebuilt without losing track of where they point.
//!
//! # Example
//!
//! ```
//! use yamlgraft::document::node::{mapping_node, string_node, NodeKind};
//!
//! let map = mapping_node();
//! map.borrow_mut().content.push(string_node("name"));
//! map.borrow_mut().content.push(string_node("yamlgraft"));
//!
//! assert_eq!(map.borrow().kind, NodeKind::Mapping);
//! assert_eq!(map.borrow().content.len(), 2);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable handle to a node in a YAML tree.
pub type NodeRef = Rc<RefCell<YamlNode>>;

pub const NULL_TAG: &str = "!!null";
pub const BOOL_TAG: &str = "!!bool";
pub const STR_TAG: &str = "!!str";
pub const INT_TAG: &str = "!!int";
pub const FLOAT_TAG: &str = "!!float";
pub const MAP_TAG: &str = "!!map";
pub const SEQ_TAG: &str = "!!seq";

/// The structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// A whole document; holds exactly one content node.
    Document,
    /// Alternating key and value children.
    Mapping,
    /// Ordered children.
    Sequence,
    #[default]
    Scalar,
    /// A reference (`*name`) to an anchored node.
    Alias,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// Presentation style of a node.
///
/// `Plain` on a mapping or sequence means block style; `Flow` marks the
/// bracketed inline forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` block scalar
    Literal,
    /// `>` block scalar
    Folded,
    Flow,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Plain => "plain",
            Style::SingleQuoted => "single-quoted",
            Style::DoubleQuoted => "double-quoted",
            Style::Literal => "literal",
            Style::Folded => "folded",
            Style::Flow => "flow",
        };
        f.write_str(name)
    }
}

/// A single node of a YAML tree, together with its decoration.
///
/// Mapping children are stored flat: even positions hold keys, odd positions
/// hold the value belonging to the key before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlNode {
    pub kind: NodeKind,
    pub style: Style,
    /// Resolved tag, e.g. `!!str`, `!!map` or a custom `!Ref`.
    pub tag: String,
    /// Scalar text, or the anchor name an alias refers to.
    pub value: String,
    /// Anchor defined on this node; empty when there is none.
    pub anchor: String,
    /// Target of an alias node.
    pub alias: Option<NodeRef>,
    pub content: Vec<NodeRef>,
    pub head_comment: String,
    pub line_comment: String,
    pub foot_comment: String,
    /// 1-based source line, 0 for nodes that were never parsed.
    pub line: usize,
    /// 1-based source column, 0 for nodes that were never parsed.
    pub column: usize,
}

impl YamlNode {
    /// Creates a node of the given kind with the implicit tag for that kind.
    pub fn new(kind: NodeKind) -> Self {
        let tag = match kind {
            NodeKind::Mapping => MAP_TAG,
            NodeKind::Sequence => SEQ_TAG,
            _ => "",
        };
        Self {
            kind,
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Wraps the node into a shared handle.
    pub fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    /// Returns true for a scalar tagged as null.
    pub fn is_null(&self) -> bool {
        self.kind == NodeKind::Scalar && self.tag == NULL_TAG
    }

    /// Returns true for mappings and sequences.
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping | NodeKind::Sequence)
    }

    pub fn is_flow(&self) -> bool {
        self.style == Style::Flow
    }

    /// Looks up the value paired with the first scalar key whose text is `key`.
    ///
    /// Returns `None` when this node is not a mapping.
    pub fn mapping_value(&self, key: &str) -> Option<NodeRef> {
        if self.kind != NodeKind::Mapping {
            return None;
        }
        self.key_position(key)
            .and_then(|idx| self.content.get(idx + 1).cloned())
    }

    /// Returns the index of the first scalar key named `key`.
    pub fn key_position(&self, key: &str) -> Option<usize> {
        self.content
            .iter()
            .step_by(2)
            .position(|k| {
                let k = k.borrow();
                k.kind == NodeKind::Scalar && k.value == key
            })
            .map(|pair| pair * 2)
    }
}

/// Creates a `null` scalar.
pub fn null_node() -> NodeRef {
    YamlNode {
        kind: NodeKind::Scalar,
        tag: NULL_TAG.to_string(),
        value: "null".to_string(),
        ..YamlNode::default()
    }
    .into_ref()
}

/// Creates a plain string scalar, used for newly inserted mapping keys.
pub fn string_node(value: impl Into<String>) -> NodeRef {
    YamlNode {
        kind: NodeKind::Scalar,
        tag: STR_TAG.to_string(),
        value: value.into(),
        ..YamlNode::default()
    }
    .into_ref()
}

/// Creates an empty block mapping.
pub fn mapping_node() -> NodeRef {
    YamlNode::new(NodeKind::Mapping).into_ref()
}

/// Creates an empty block sequence.
pub fn sequence_node() -> NodeRef {
    YamlNode::new(NodeKind::Sequence).into_ref()
}

/// Creates a document node holding `content`.
pub fn document_node(content: NodeRef) -> NodeRef {
    let mut doc = YamlNode::new(NodeKind::Document);
    doc.content.push(content);
    doc.into_ref()
}

/// Resolves the implicit tag of a plain scalar using the YAML core schema.
///
/// ```
/// use yamlgraft::document::node::resolve_plain;
///
/// assert_eq!(resolve_plain("~"), "!!null");
/// assert_eq!(resolve_plain("0x1F"), "!!int");
/// assert_eq!(resolve_plain("-.inf"), "!!float");
/// assert_eq!(resolve_plain("yes"), "!!str");
/// ```
pub fn resolve_plain(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return NULL_TAG,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return BOOL_TAG,
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf"
        | "-.INF" | ".nan" | ".NaN" | ".NAN" => return FLOAT_TAG,
        _ => {}
    }
    if is_int(value) {
        INT_TAG
    } else if is_float(value) {
        FLOAT_TAG
    } else {
        STR_TAG
    }
}

fn is_int(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(oct) = value.strip_prefix("0o") {
        return !oct.is_empty() && oct.chars().all(|c| ('0'..='7').contains(&c));
    }
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_float(value: &str) -> bool {
    let body = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let (whole, frac) = match mantissa.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (mantissa, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = match frac {
        Some(f) => all_digits(whole) && all_digits(f) && !(whole.is_empty() && f.is_empty()),
        None => !whole.is_empty() && all_digits(whole),
    };
    let exponent_ok = match exponent {
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
        None => frac.is_some(),
    };
    mantissa_ok && exponent_ok
}
