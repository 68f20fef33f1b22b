//! YAML encoding of node trees.
//!
//! The encoder writes a tree back out with all of its decoration: comments,
//! anchors, explicit tags, flow collections and scalar styles. Block
//! collections are indented by a configurable width. Sequences under a
//! mapping key are indented too.
//!
//! # Example
//!
//! ```
//! use yamlgraft::document::encoder::to_bytes;
//! use yamlgraft::document::parser::parse_yaml;
//!
//! let doc = parse_yaml("a:\n    b: 1 # one\n").unwrap();
//! let out = to_bytes(&doc, 2).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "a:\n  b: 1 # one\n");
//! ```

use std::io::Write;

use super::node::{
    resolve_plain, NodeKind, NodeRef, Style, YamlNode, MAP_TAG, NULL_TAG, SEQ_TAG, STR_TAG,
};
use crate::error::Result;

/// Indentation used when the requested width is out of range.
pub const DEFAULT_INDENT: usize = 2;

/// Streams documents to a writer, separating them with `---`.
pub struct Encoder<W: Write> {
    writer: W,
    indent: usize,
    documents: usize,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent: DEFAULT_INDENT,
            documents: 0,
        }
    }

    /// Sets the indentation width. Widths outside `2..=9` fall back to 2.
    pub fn set_indent(&mut self, spaces: usize) {
        self.indent = if (2..=9).contains(&spaces) {
            spaces
        } else {
            DEFAULT_INDENT
        };
    }

    /// Writes one document. A node that is not a document is written as the
    /// content of an implicit one.
    pub fn encode(&mut self, node: &NodeRef) -> Result<()> {
        let mut emitter = Emitter {
            out: String::new(),
            width: self.indent,
        };
        if self.documents > 0 {
            emitter.out.push_str("---\n");
        }
        emitter.document(&node.borrow());
        self.writer.write_all(emitter.out.as_bytes())?;
        self.documents += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encodes a single node or document into a byte buffer.
pub fn to_bytes(node: &NodeRef, indent: usize) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.set_indent(indent);
    encoder.encode(node)?;
    Ok(encoder.into_inner())
}

struct Emitter {
    out: String,
    width: usize,
}

impl Emitter {
    fn document(&mut self, node: &YamlNode) {
        if node.kind != NodeKind::Document {
            self.root(node);
            return;
        }
        if !node.head_comment.is_empty() {
            self.comment_lines(&node.head_comment, 0);
            self.out.push('\n');
        }
        if let Some(content) = node.content.first() {
            self.root(&content.borrow());
        }
        self.comment_lines(&node.foot_comment, 0);
    }

    fn root(&mut self, node: &YamlNode) {
        self.comment_lines(&node.head_comment, 0);
        if is_block(node) {
            let props = properties(node, "");
            if !props.is_empty() {
                self.out.push_str(&props);
                self.line_comments(&[&node.line_comment]);
                self.out.push('\n');
            } else if !node.line_comment.is_empty() {
                self.comment_lines(&node.line_comment, 0);
            }
            self.block_body(node, 0, false);
        } else if is_block_scalar(node) {
            self.block_scalar(node, &[&node.line_comment], self.width);
        } else {
            let mut text = self.inline(node, false);
            // A bare empty line would read back as no document at all
            if text.is_empty() {
                text.push_str("null");
            }
            self.out.push_str(&text);
            self.line_comments(&[&node.line_comment]);
            self.out.push('\n');
        }
        self.comment_lines(&node.foot_comment, 0);
    }

    fn block_body(&mut self, node: &YamlNode, indent: usize, inline_first: bool) {
        match node.kind {
            NodeKind::Mapping => self.block_mapping(node, indent, inline_first),
            NodeKind::Sequence => self.block_sequence(node, indent, inline_first),
            _ => {}
        }
    }

    fn block_mapping(&mut self, node: &YamlNode, indent: usize, inline_first: bool) {
        for (i, pair) in node.content.chunks(2).enumerate() {
            let key = pair[0].borrow();
            if i > 0 || !inline_first {
                self.comment_lines(&key.head_comment, indent);
                self.pad(indent);
            }
            let key_text = self.inline(&key, false);
            self.out.push_str(&key_text);
            if key.kind == NodeKind::Alias {
                self.out.push(' ');
            }
            self.out.push(':');
            match pair.get(1) {
                Some(value) => self.mapping_value(&key, &value.borrow(), indent),
                None => {
                    self.line_comments(&[&key.line_comment]);
                    self.out.push('\n');
                }
            }
            self.comment_lines(&key.foot_comment, indent);
        }
    }

    fn mapping_value(&mut self, key: &YamlNode, value: &YamlNode, indent: usize) {
        let child = indent + self.width;
        if is_block(value) {
            let props = properties(value, "");
            if !props.is_empty() {
                self.out.push(' ');
                self.out.push_str(&props);
            }
            self.line_comments(&[&key.line_comment, &value.line_comment]);
            self.out.push('\n');
            self.comment_lines(&value.head_comment, child);
            self.block_body(value, child, false);
            self.comment_lines(&value.foot_comment, child);
        } else if is_block_scalar(value) {
            self.comment_lines(&value.head_comment, child);
            self.out.push(' ');
            self.block_scalar(value, &[&key.line_comment, &value.line_comment], child);
            self.comment_lines(&value.foot_comment, child);
        } else if !value.head_comment.is_empty() {
            self.line_comments(&[&key.line_comment]);
            self.out.push('\n');
            self.comment_lines(&value.head_comment, child);
            self.pad(child);
            let text = self.inline(value, false);
            self.out.push_str(&text);
            self.line_comments(&[&value.line_comment]);
            self.out.push('\n');
            self.comment_lines(&value.foot_comment, child);
        } else {
            let text = self.inline(value, false);
            if !text.is_empty() {
                self.out.push(' ');
                self.out.push_str(&text);
            }
            self.line_comments(&[&key.line_comment, &value.line_comment]);
            self.out.push('\n');
            self.comment_lines(&value.foot_comment, child);
        }
    }

    fn block_sequence(&mut self, node: &YamlNode, indent: usize, inline_first: bool) {
        for (i, item) in node.content.iter().enumerate() {
            let item = item.borrow();
            if i > 0 || !inline_first {
                self.comment_lines(&item.head_comment, indent);
                self.pad(indent);
            }
            self.out.push('-');
            self.sequence_item(&item, indent);
            self.comment_lines(&item.foot_comment, indent);
        }
    }

    fn sequence_item(&mut self, item: &YamlNode, indent: usize) {
        let child = indent + 2;
        if is_block(item) {
            let props = properties(item, "");
            if props.is_empty() && item.line_comment.is_empty() && !first_entry_has_head(item) {
                self.out.push(' ');
                self.block_body(item, child, true);
            } else {
                if !props.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&props);
                }
                self.line_comments(&[&item.line_comment]);
                self.out.push('\n');
                self.block_body(item, child, false);
            }
        } else if is_block_scalar(item) {
            self.out.push(' ');
            self.block_scalar(item, &[&item.line_comment], indent + self.width);
        } else {
            let text = self.inline(item, false);
            if !text.is_empty() {
                self.out.push(' ');
                self.out.push_str(&text);
            }
            self.line_comments(&[&item.line_comment]);
            self.out.push('\n');
        }
    }

    /// Writes a `|` or `>` scalar: header line first, then the body at `indent`.
    fn block_scalar(&mut self, node: &YamlNode, comments: &[&str], indent: usize) {
        let value = node.value.as_str();
        let body = value.strip_suffix('\n').unwrap_or(value);
        let folded = node.style == Style::Folded
            && !body.starts_with('\n')
            && body.split('\n').all(|l| !l.starts_with([' ', '\t']));

        let props = properties(node, STR_TAG);
        if !props.is_empty() {
            self.out.push_str(&props);
            self.out.push(' ');
        }
        self.out.push(if folded { '>' } else { '|' });
        if body.trim_start_matches('\n').starts_with(' ') {
            self.out.push_str(&self.width.to_string());
        }
        if !value.ends_with('\n') {
            self.out.push('-');
        } else if value.ends_with("\n\n") {
            self.out.push('+');
        }
        self.line_comments(comments);
        self.out.push('\n');

        for (i, line) in body.split('\n').enumerate() {
            if folded && i > 0 {
                self.out.push('\n');
            }
            if line.is_empty() {
                if !folded {
                    self.out.push('\n');
                }
                continue;
            }
            self.pad(indent);
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    /// Renders a node on a single line, in flow style where it has children.
    fn inline(&self, node: &YamlNode, flow: bool) -> String {
        let body = match node.kind {
            NodeKind::Scalar => return self.inline_scalar(node, flow),
            NodeKind::Alias => return format!("*{}", node.value),
            NodeKind::Document => {
                return node
                    .content
                    .first()
                    .map(|c| self.inline(&c.borrow(), flow))
                    .unwrap_or_default()
            }
            NodeKind::Mapping => {
                let pairs: Vec<String> = node
                    .content
                    .chunks(2)
                    .map(|pair| {
                        let key = pair[0].borrow();
                        let mut text = self.inline(&key, true);
                        if key.kind == NodeKind::Alias {
                            text.push(' ');
                        }
                        text.push(':');
                        if let Some(value) = pair.get(1) {
                            let value = self.inline(&value.borrow(), true);
                            if !value.is_empty() {
                                text.push(' ');
                                text.push_str(&value);
                            }
                        }
                        text
                    })
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
            NodeKind::Sequence => {
                let items: Vec<String> = node
                    .content
                    .iter()
                    .map(|item| self.inline(&item.borrow(), true))
                    .collect();
                format!("[{}]", items.join(", "))
            }
        };
        join_props(properties(node, ""), body)
    }

    fn inline_scalar(&self, node: &YamlNode, flow: bool) -> String {
        let value = node.value.as_str();
        let style = scalar_style(node, flow);
        let (text, implicit) = match style {
            Style::SingleQuoted => (format!("'{}'", value.replace('\'', "''")), STR_TAG),
            Style::DoubleQuoted => (double_quote(value), STR_TAG),
            _ if value.is_empty() && flow => ("null".to_string(), NULL_TAG),
            _ => (value.to_string(), resolve_plain(value)),
        };
        join_props(properties(node, implicit), text)
    }

    fn line_comments(&mut self, comments: &[&str]) {
        for comment in comments.iter().filter(|c| !c.is_empty()) {
            self.out.push(' ');
            self.out.push_str(&format_comment(&comment.replace('\n', " ")));
        }
    }

    fn comment_lines(&mut self, text: &str, indent: usize) {
        if text.is_empty() {
            return;
        }
        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                self.out.push('\n');
                continue;
            }
            self.pad(indent);
            self.out.push_str(&format_comment(line));
            self.out.push('\n');
        }
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }
}

fn is_block(node: &YamlNode) -> bool {
    node.is_collection() && node.style != Style::Flow && !node.content.is_empty()
}

fn is_block_scalar(node: &YamlNode) -> bool {
    node.kind == NodeKind::Scalar
        && matches!(node.style, Style::Literal | Style::Folded)
        && !node.value.trim().is_empty()
        && !node
            .value
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t')
}

fn first_entry_has_head(node: &YamlNode) -> bool {
    node.content
        .first()
        .is_some_and(|first| !first.borrow().head_comment.is_empty())
}

/// Anchor and tag prefix of a node, omitting a tag equal to `implicit`.
fn properties(node: &YamlNode, implicit: &str) -> String {
    let implicit = match node.kind {
        NodeKind::Mapping => MAP_TAG,
        NodeKind::Sequence => SEQ_TAG,
        _ => implicit,
    };
    let mut props = Vec::new();
    if !node.anchor.is_empty() {
        props.push(format!("&{}", node.anchor));
    }
    if !node.tag.is_empty() && node.tag != implicit && node.kind != NodeKind::Alias {
        props.push(node.tag.clone());
    }
    props.join(" ")
}

fn join_props(props: String, body: String) -> String {
    match (props.is_empty(), body.is_empty()) {
        (true, _) => body,
        (false, true) => props,
        (false, false) => format!("{} {}", props, body),
    }
}

/// Picks a single-line style that reads back as the same scalar.
fn scalar_style(node: &YamlNode, flow: bool) -> Style {
    let value = node.value.as_str();
    let needs_escapes = value.chars().any(|c| c.is_control() && c != '\t');
    match node.style {
        Style::DoubleQuoted => Style::DoubleQuoted,
        Style::SingleQuoted if !needs_escapes => Style::SingleQuoted,
        _ if needs_escapes => Style::DoubleQuoted,
        Style::Literal | Style::Folded => Style::SingleQuoted,
        _ if value.is_empty() && node.tag != STR_TAG => Style::Plain,
        _ if !plain_safe(value, flow) => Style::SingleQuoted,
        _ if node.tag == STR_TAG && resolve_plain(value) != STR_TAG => Style::SingleQuoted,
        _ => Style::Plain,
    }
}

fn plain_safe(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if first.is_whitespace() || value.ends_with(char::is_whitespace) {
        return false;
    }
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    if "#,[]{}&*!|>'\"%@`".contains(first) {
        return false;
    }
    if matches!(first, '-' | '?' | ':') {
        let second = value.chars().nth(1);
        if second.map_or(true, |c| c.is_whitespace() || (flow && ",[]{}".contains(c))) {
            return false;
        }
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    !(flow && value.contains([',', '[', ']', '{', '}']))
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() && (c as u32) <= 0xFF => {
                out.push_str(&format!("\\x{:02X}", c as u32))
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn format_comment(line: &str) -> String {
    if line.starts_with('#') {
        line.to_string()
    } else {
        format!("# {}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::{null_node, string_node};
    use crate::document::parser::{parse_yaml, parse_yaml_documents};

    fn round_trip(input: &str) -> String {
        let doc = parse_yaml(input).unwrap();
        String::from_utf8(to_bytes(&doc, 2).unwrap()).unwrap()
    }

    #[test]
    fn test_canonical_documents_round_trip_unchanged() {
        let inputs = [
            "# hello world\n\nfoo: bar\nlist: [1, 2, 3]\n",
            "a:\n  b: 1 # one\n  # after b\nc:\n  - x\n  - y: 2\n    z: 3\n",
            "text: |\n  line one\n  line two\nstrip: |-\n  no newline\nquoted: 'a: b'\ndouble: \"tab\\there\"\n",
            "base: &base\n  x: 1\nref: *base\n",
            "empty:\nflow: {a: 1, b: [x, y]}\nnone: {}\n",
            "- - a\n  - b\n- c\n",
            "script: |\n  echo hi\n  # not a comment\n  echo bye\nnext: 1\n",
            "steps:\n  - run: |-\n      make\n      # still text\n  - done\n",
            "cmd: make && make install\nbase: &b 1\nref: *b\n",
            "text: |\n  x &y\nbase: &b 1\nref: *b\n",
        ];
        for input in inputs {
            assert_eq!(round_trip(input), input);
        }
    }

    #[test]
    fn test_block_scalar_comment_lines_do_not_grow() {
        let input = "script: |\n  # step one\n  make\n# after script\nnext: 1\n";
        let once = round_trip(input);
        assert_eq!(once, input);
        assert_eq!(round_trip(&once), input);
    }

    #[test]
    fn test_empty_document_encodes_as_null() {
        for input in ["---\n", "# head\n\n---\n"] {
            let docs = parse_yaml_documents(input).unwrap();
            assert_eq!(docs.len(), 1);
            let out = String::from_utf8(to_bytes(&docs[0], 2).unwrap()).unwrap();
            assert!(out.ends_with("null\n"), "{:?}", out);
            assert_eq!(parse_yaml_documents(&out).unwrap().len(), 1);
        }
        assert_eq!(
            String::from_utf8(to_bytes(&null_node(), 2).unwrap()).unwrap(),
            "null\n"
        );
    }

    #[test]
    fn test_reindents_to_requested_width() {
        let doc = parse_yaml("a:\n  b:\n    - 1\n").unwrap();
        let out = String::from_utf8(to_bytes(&doc, 4).unwrap()).unwrap();
        assert_eq!(out, "a:\n    b:\n        - 1\n");
    }

    #[test]
    fn test_out_of_range_indent_falls_back() {
        let doc = parse_yaml("a:\n  b: 1\n").unwrap();
        let out = String::from_utf8(to_bytes(&doc, 0).unwrap()).unwrap();
        assert_eq!(out, "a:\n  b: 1\n");
    }

    #[test]
    fn test_strings_that_would_change_type_are_quoted() {
        let map = YamlNode::new(NodeKind::Mapping).into_ref();
        {
            let mut m = map.borrow_mut();
            for (k, v) in [("num", "12"), ("flag", "true"), ("colon", "a: b"), ("empty", "")] {
                m.content.push(string_node(k));
                m.content.push(string_node(v));
            }
            m.content.push(string_node("nothing"));
            m.content.push(null_node());
        }
        let out = String::from_utf8(to_bytes(&map, 2).unwrap()).unwrap();
        assert_eq!(
            out,
            "num: '12'\nflag: 'true'\ncolon: 'a: b'\nempty: ''\nnothing: null\n"
        );
    }

    #[test]
    fn test_multiline_plain_strings_use_double_quotes() {
        let node = string_node("one\ntwo");
        let out = String::from_utf8(to_bytes(&node, 2).unwrap()).unwrap();
        assert_eq!(out, "\"one\\ntwo\"\n");
    }

    #[test]
    fn test_value_head_comment_moves_scalar_to_next_line() {
        let doc = parse_yaml("key: value\n").unwrap();
        {
            let doc = doc.borrow();
            let root = doc.content[0].borrow();
            let mut value = root.content[1].borrow_mut();
            value.head_comment = "about value".to_string();
            value.line_comment = "# trailing".to_string();
        }
        let out = String::from_utf8(to_bytes(&doc, 2).unwrap()).unwrap();
        assert_eq!(out, "key:\n  # about value\n  value # trailing\n");
    }

    #[test]
    fn test_folded_scalar_keeps_line_breaks() {
        let doc = parse_yaml("text: >\n  first\n\n  second\n").unwrap();
        assert_eq!(
            String::from_utf8(to_bytes(&doc, 2).unwrap()).unwrap(),
            "text: >\n  first\n\n  second\n"
        );
    }

    #[test]
    fn test_encoder_separates_documents() {
        let docs = parse_yaml_documents("a: 1\n---\nb: 2\n").unwrap();
        let mut encoder = Encoder::new(Vec::new());
        for doc in &docs {
            encoder.encode(doc).unwrap();
        }
        let out = String::from_utf8(encoder.into_inner()).unwrap();
        assert_eq!(out, "a: 1\n---\nb: 2\n");
    }
}
