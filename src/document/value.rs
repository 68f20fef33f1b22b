//! Conversion of node trees into plain serde data.
//!
//! `YamlNode` implements `Serialize`, mapping each node to the data model
//! value its tag describes. Decoration is dropped. This is what typed
//! extraction and JSON output are built on.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::node::{NodeKind, YamlNode, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG};

impl Serialize for YamlNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.kind {
            NodeKind::Document => match self.content.first() {
                Some(content) => content.borrow().serialize(serializer),
                None => serializer.serialize_unit(),
            },
            NodeKind::Mapping => {
                let mut map = serializer.serialize_map(Some(self.content.len() / 2))?;
                for pair in self.content.chunks(2) {
                    let key = pair[0].borrow();
                    match pair.get(1) {
                        Some(value) => map.serialize_entry(&*key, &*value.borrow())?,
                        None => map.serialize_entry(&*key, &())?,
                    }
                }
                map.end()
            }
            NodeKind::Sequence => {
                let mut seq = serializer.serialize_seq(Some(self.content.len()))?;
                for item in &self.content {
                    seq.serialize_element(&*item.borrow())?;
                }
                seq.end()
            }
            NodeKind::Alias => match &self.alias {
                Some(target) => target.borrow().serialize(serializer),
                None => Err(S::Error::custom(format!(
                    "alias *{} has no anchored node",
                    self.value
                ))),
            },
            NodeKind::Scalar => serialize_scalar(self, serializer),
        }
    }
}

fn serialize_scalar<S: Serializer>(node: &YamlNode, serializer: S) -> Result<S::Ok, S::Error> {
    let value = node.value.as_str();
    match node.tag.as_str() {
        NULL_TAG => serializer.serialize_unit(),
        BOOL_TAG => match parse_bool(value) {
            Some(b) => serializer.serialize_bool(b),
            None => serializer.serialize_str(value),
        },
        INT_TAG => {
            if let Some(i) = parse_int(value) {
                serializer.serialize_i64(i)
            } else if let Ok(u) = value.parse::<u64>() {
                serializer.serialize_u64(u)
            } else {
                serializer.serialize_str(value)
            }
        }
        FLOAT_TAG => match parse_float(value) {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(value),
        },
        _ => serializer.serialize_str(value),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        return value.parse::<i64>().ok();
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float(value: &str) -> Option<f64> {
    match value {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => value.parse::<f64>().ok(),
    }
}
