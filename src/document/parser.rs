//! YAML decoding into comment-carrying node trees.
//!
//! Structure comes from yaml-rust2's event parser. The events carry positions
//! but no comments, so a second pass walks the source line by line and hangs
//! every comment on the node it belongs to:
//!
//! - a trailing `# ...` becomes the line comment of the last node starting on
//!   that line,
//! - a comment block right above an entry (indented no deeper than the entry)
//!   becomes that entry's head comment,
//! - a comment block at the top of a document that is followed by a blank line
//!   becomes the document's head comment,
//! - anything else is a foot comment of the closest preceding entry at the
//!   same or a shallower indentation.
//!
//! An entry is a mapping key or a sequence item.
//!
//! # Example
//!
//! ```
//! use yamlgraft::document::parser::parse_yaml;
//!
//! let doc = parse_yaml("# config\n\nname: demo # inline\n").unwrap();
//! let doc = doc.borrow();
//! assert_eq!(doc.head_comment, "# config");
//!
//! let root = doc.content[0].borrow();
//! assert_eq!(root.content[1].borrow().line_comment, "# inline");
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Read;

use tracing::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use super::node::{resolve_plain, NodeKind, NodeRef, Style, YamlNode, STR_TAG};
use crate::error::{Error, Result};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Parses the first document of `input`.
///
/// The returned node has kind `Document` and holds the root value as its only
/// child.
pub fn parse_yaml(input: &str) -> Result<NodeRef> {
    parse_yaml_documents(input)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidArgument("input contains no YAML document".to_string()))
}

/// Parses every document of a (possibly multi-document) YAML stream.
pub fn parse_yaml_documents(input: &str) -> Result<Vec<NodeRef>> {
    let source = Source::new(input);
    let mut builder = TreeBuilder::new(&source);
    let mut parser = Parser::new_from_str(input);
    parser.load(&mut builder, true)?;

    let documents = builder.documents.clone();
    let attached = CommentPass::new(&source, &builder).run();
    debug!(
        documents = documents.len(),
        comments = attached,
        "parsed YAML stream"
    );
    Ok(documents)
}

/// Reads documents one at a time from a byte stream.
///
/// The whole stream is read and parsed on the first call to `decode`.
pub struct Decoder<R> {
    reader: Option<R>,
    pending: VecDeque<NodeRef>,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            pending: VecDeque::new(),
        }
    }

    /// Returns the next document node, or `None` once the stream is exhausted.
    pub fn decode(&mut self) -> Result<Option<NodeRef>> {
        if let Some(mut reader) = self.reader.take() {
            let mut input = String::new();
            reader.read_to_string(&mut input)?;
            self.pending = parse_yaml_documents(&input)?.into();
        }
        Ok(self.pending.pop_front())
    }
}

/// Source text indexed by character, as yaml-rust2 markers are.
struct Source {
    chars: Vec<char>,
    line_starts: Vec<usize>,
    lines: Vec<String>,
}

impl Source {
    fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (idx, ch) in chars.iter().enumerate() {
            if *ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self {
            chars,
            line_starts,
            lines,
        }
    }

    /// 0-based line and column of a character index.
    fn position(&self, idx: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= idx)
            .saturating_sub(1);
        (line, idx - self.line_starts[line])
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    /// True when the node starting at `idx` is a bracketed flow collection.
    fn opens_flow(&self, mut idx: usize) -> bool {
        loop {
            match self.char_at(idx) {
                Some('&') | Some('!') => {
                    while matches!(self.char_at(idx), Some(c) if !c.is_whitespace()) {
                        idx += 1;
                    }
                    while matches!(self.char_at(idx), Some(c) if c.is_whitespace()) {
                        idx += 1;
                    }
                }
                Some('[') | Some('{') => return true,
                _ => return false,
            }
        }
    }

    /// Every `&name` token outside comments and quotes, in source order.
    ///
    /// Stray ampersands in plain text show up here too; `anchor_before`
    /// filters them by position.
    fn anchor_tokens(&self) -> Vec<AnchorToken> {
        let mut tokens = Vec::new();
        for (line_no, line) in self.lines.iter().enumerate() {
            let code = match find_comment(line) {
                Some(idx) => &line[..idx],
                None => line.as_str(),
            };
            let chars: Vec<char> = code.chars().collect();
            let mut quote = None;
            let mut i = 0;
            while i < chars.len() {
                let c = chars[i];
                let prev = if i == 0 { None } else { Some(chars[i - 1]) };
                match quote {
                    Some(q) if c == q => quote = None,
                    Some(_) => {}
                    None if is_token_start(prev) && (c == '\'' || c == '"') => quote = Some(c),
                    None if c == '&' && is_token_start(prev) => {
                        let name: String = chars[i + 1..]
                            .iter()
                            .take_while(|c| !c.is_whitespace() && !",[]{}".contains(**c))
                            .collect();
                        if !name.is_empty() {
                            let len = name.chars().count();
                            let start = self.line_starts[line_no] + i;
                            tokens.push(AnchorToken {
                                start,
                                end: start + 1 + len,
                                name,
                            });
                            i += len;
                        }
                    }
                    None => {}
                }
                i += 1;
            }
        }
        tokens
    }

    /// True when only whitespace, tags and comments lie in `from..to`.
    fn only_properties_between(&self, from: usize, to: usize) -> bool {
        let mut idx = from;
        while idx < to {
            match self.char_at(idx) {
                Some(c) if c.is_whitespace() => idx += 1,
                Some('#') => {
                    while idx < to && self.char_at(idx) != Some('\n') {
                        idx += 1;
                    }
                }
                Some('!') => {
                    while idx < to && matches!(self.char_at(idx), Some(c) if !c.is_whitespace()) {
                        idx += 1;
                    }
                }
                _ => return false,
            }
        }
        true
    }

    /// The line holding the `|` or `>` indicator of the block scalar whose
    /// event was marked at `idx`.
    ///
    /// The mark may sit on the indicator itself or on the first content
    /// line, so blank lines above the mark are skipped on the way up.
    fn block_indicator_line(&self, idx: usize) -> usize {
        let (mark_line, mark_col) = self.position(idx.min(self.chars.len()));
        if block_indicator_column(&self.lines[mark_line]).is_some_and(|col| col <= mark_col) {
            return mark_line;
        }
        let mut line = mark_line;
        while line > 0 {
            line -= 1;
            let text = &self.lines[line];
            if text.trim().is_empty() {
                continue;
            }
            if block_indicator_column(text).is_some() {
                return line;
            }
            break;
        }
        mark_line
    }
}

/// An `&name` token in the source, by character index.
struct AnchorToken {
    start: usize,
    end: usize,
    name: String,
}

/// Column of a trailing block scalar indicator (`|`, `>-`, `|2+`, ...) on
/// `line`, ignoring any comment after it.
fn block_indicator_column(line: &str) -> Option<usize> {
    let code = match find_comment(line) {
        Some(idx) => &line[..idx],
        None => line,
    };
    let code = code.trim_end();
    let head = code.trim_end_matches(|c: char| c == '+' || c == '-' || c.is_ascii_digit());
    let before = head.strip_suffix(['|', '>'])?;
    if before.is_empty() || before.ends_with([' ', '\t']) {
        Some(before.chars().count())
    } else {
        None
    }
}

fn is_token_start(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(p) => p.is_whitespace() || "[{,".contains(p),
    }
}

/// Byte offset of a comment on `line`, ignoring `#` inside quoted tokens.
fn find_comment(line: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        let prev = if i == 0 { None } else { Some(chars[i - 1].1) };
        match quote {
            Some('"') if c == '\\' => i += 1,
            Some('\'') if c == '\'' => {
                if matches!(chars.get(i + 1), Some((_, '\''))) {
                    i += 1;
                } else {
                    quote = None;
                }
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                if c == '#' && prev.map_or(true, char::is_whitespace) {
                    return Some(offset);
                }
                if (c == '\'' || c == '"') && is_token_start(prev) {
                    quote = Some(c);
                }
            }
        }
        i += 1;
    }
    None
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn normalize_tag(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "!!" => format!("!!{}", tag.suffix),
        CORE_TAG_PREFIX => format!("!!{}", tag.suffix),
        "!" if tag.suffix.is_empty() => String::new(),
        "" => match tag.suffix.strip_prefix(CORE_TAG_PREFIX) {
            Some(core) => format!("!!{}", core),
            None => format!("!<{}>", tag.suffix),
        },
        handle => format!("{}{}", handle, tag.suffix),
    }
}

/// A mapping key or sequence item, remembered for comment placement.
struct Entry {
    line: usize,
    indent: usize,
    document: usize,
    node: NodeRef,
}

/// Receives parser events and assembles the node tree.
struct TreeBuilder<'a> {
    source: &'a Source,
    anchor_tokens: Vec<AnchorToken>,
    anchors: HashMap<usize, NodeRef>,
    stack: Vec<NodeRef>,
    flow_depth: usize,
    documents: Vec<NodeRef>,
    document_starts: Vec<usize>,
    entries: Vec<Entry>,
    /// Last node starting on each line outside flow collections.
    inline: BTreeMap<usize, NodeRef>,
    /// Lines holding a `|` or `>` indicator.
    block_scalars: Vec<usize>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a Source) -> Self {
        Self {
            source,
            anchor_tokens: source.anchor_tokens(),
            anchors: HashMap::new(),
            stack: Vec::new(),
            flow_depth: 0,
            documents: Vec::new(),
            document_starts: Vec::new(),
            entries: Vec::new(),
            inline: BTreeMap::new(),
            block_scalars: Vec::new(),
        }
    }

    fn positioned(&self, kind: NodeKind, mark: &Marker) -> (YamlNode, usize, usize) {
        let (line, col) = self.source.position(mark.index());
        let mut node = YamlNode::new(kind);
        node.line = line + 1;
        node.column = col + 1;
        (node, line, col)
    }

    /// Name of the anchor written right before the node marked at `idx`.
    fn anchor_before(&self, idx: usize) -> Option<String> {
        let count = self.anchor_tokens.partition_point(|t| t.start < idx);
        let token = self.anchor_tokens[..count].last()?;
        self.source
            .only_properties_between(token.end, idx)
            .then(|| token.name.clone())
    }

    fn register_anchor(&mut self, anchor_id: usize, node: &NodeRef, mark: &Marker) {
        if anchor_id == 0 {
            return;
        }
        let name = self
            .anchor_before(mark.index())
            .unwrap_or_else(|| format!("anchor{}", anchor_id));
        node.borrow_mut().anchor = name;
        self.anchors.insert(anchor_id, node.clone());
    }

    /// Adds `node` to the innermost open collection and records it for
    /// comment placement.
    fn attach(&mut self, node: &NodeRef, line: usize, col: usize) {
        let Some(parent) = self.stack.last().cloned() else {
            return;
        };
        let (parent_kind, position, parent_column) = {
            let p = parent.borrow();
            (p.kind, p.content.len(), p.column)
        };
        parent.borrow_mut().content.push(node.clone());

        if self.flow_depth > 0 {
            return;
        }
        self.inline.insert(line, node.clone());

        let indent = match parent_kind {
            NodeKind::Mapping if position % 2 == 0 => Some(col),
            NodeKind::Sequence => Some(parent_column.saturating_sub(1)),
            _ => None,
        };
        if let Some(indent) = indent {
            self.entries.push(Entry {
                line,
                indent,
                document: self.documents.len(),
                node: node.clone(),
            });
        }
    }

    fn start_collection(
        &mut self,
        kind: NodeKind,
        anchor_id: usize,
        tag: Option<Tag>,
        mark: &Marker,
    ) {
        let (mut node, line, col) = self.positioned(kind, mark);
        if self.flow_depth > 0 || self.source.opens_flow(mark.index()) {
            node.style = Style::Flow;
        }
        if let Some(tag) = tag.as_ref().map(normalize_tag).filter(|t| !t.is_empty()) {
            node.tag = tag;
        }
        let flow = node.style == Style::Flow;
        let node = node.into_ref();
        self.register_anchor(anchor_id, &node, mark);
        self.attach(&node, line, col);
        if flow {
            self.flow_depth += 1;
        }
        self.stack.push(node);
    }

    fn end_collection(&mut self) {
        if let Some(node) = self.stack.pop() {
            if node.borrow().is_flow() {
                self.flow_depth = self.flow_depth.saturating_sub(1);
            }
        }
    }

    fn scalar(
        &mut self,
        value: String,
        style: TScalarStyle,
        anchor_id: usize,
        tag: Option<Tag>,
        mark: &Marker,
    ) {
        let (mut node, mut line, col) = self.positioned(NodeKind::Scalar, mark);
        node.style = match style {
            TScalarStyle::Plain => Style::Plain,
            TScalarStyle::SingleQuoted => Style::SingleQuoted,
            TScalarStyle::DoubleQuoted => Style::DoubleQuoted,
            TScalarStyle::Literal => Style::Literal,
            _ => Style::Folded,
        };
        // yaml-rust2 reports an omitted value as a plain `~`
        let synthesized = node.style == Style::Plain
            && value == "~"
            && self.source.char_at(mark.index()) != Some('~');
        node.value = if synthesized { String::new() } else { value };
        node.tag = match tag.as_ref().map(normalize_tag).filter(|t| !t.is_empty()) {
            Some(tag) => tag,
            None if node.style == Style::Plain => resolve_plain(&node.value).to_string(),
            None => STR_TAG.to_string(),
        };
        if matches!(node.style, Style::Literal | Style::Folded) {
            line = self.source.block_indicator_line(mark.index());
            node.line = line + 1;
            self.block_scalars.push(line);
        }
        let node = node.into_ref();
        self.register_anchor(anchor_id, &node, mark);
        self.attach(&node, line, col);
    }

    fn alias(&mut self, anchor_id: usize, mark: &Marker) {
        let (mut node, line, col) = self.positioned(NodeKind::Alias, mark);
        node.tag = String::new();
        if let Some(target) = self.anchors.get(&anchor_id) {
            node.value = target.borrow().anchor.clone();
            node.alias = Some(target.clone());
        }
        let node = node.into_ref();
        self.attach(&node, line, col);
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::DocumentStart { .. } => {
                let (node, line, _) = self.positioned(NodeKind::Document, &mark);
                self.document_starts.push(line);
                self.flow_depth = 0;
                self.stack.push(node.into_ref());
            }
            Event::DocumentEnd { .. } => {
                if let Some(doc) = self.stack.first().cloned() {
                    self.documents.push(doc);
                }
                self.stack.clear();
            }
            Event::MappingStart(anchor_id, tag) => {
                self.start_collection(NodeKind::Mapping, anchor_id, tag, &mark)
            }
            Event::SequenceStart(anchor_id, tag) => {
                self.start_collection(NodeKind::Sequence, anchor_id, tag, &mark)
            }
            Event::MappingEnd | Event::SequenceEnd => self.end_collection(),
            Event::Scalar(value, style, anchor_id, tag) => {
                self.scalar(value, style, anchor_id, tag, &mark)
            }
            Event::Alias(anchor_id) => self.alias(anchor_id, &mark),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    Blank,
    Comment { indent: usize, text: String },
    Content { indent: usize },
    /// `---`, `...` and directives
    Marker,
    /// Inside a block scalar
    Opaque,
}

/// Places comments found in the source onto the built tree.
struct CommentPass<'a> {
    kinds: Vec<LineKind>,
    trailing: Vec<(usize, String)>,
    builder: &'a TreeBuilder<'a>,
    first_entry: HashMap<usize, usize>,
}

impl<'a> CommentPass<'a> {
    fn new(source: &Source, builder: &'a TreeBuilder<'a>) -> Self {
        let mut kinds = Vec::with_capacity(source.lines.len());
        let mut trailing = Vec::new();
        for (idx, line) in source.lines.iter().enumerate() {
            let trimmed = line.trim();
            let kind = if trimmed.is_empty() {
                LineKind::Blank
            } else if trimmed.starts_with('#') {
                LineKind::Comment {
                    indent: leading_spaces(line),
                    text: trimmed.to_string(),
                }
            } else if is_marker(line) {
                LineKind::Marker
            } else {
                LineKind::Content {
                    indent: leading_spaces(line),
                }
            };
            if matches!(kind, LineKind::Content { .. } | LineKind::Marker) {
                if let Some(offset) = find_comment(line) {
                    trailing.push((idx, line[offset..].trim_end().to_string()));
                }
            }
            kinds.push(kind);
        }

        // Block scalar bodies run while lines stay at the indentation of
        // their first non-blank line.
        for &start in &builder.block_scalars {
            let parent = leading_spaces(&source.lines[start]);
            let body = source
                .lines
                .iter()
                .skip(start + 1)
                .find(|line| !line.trim().is_empty())
                .map(|line| leading_spaces(line))
                .filter(|&indent| indent > parent);
            let mut last = start;
            if let Some(body) = body {
                for (idx, line) in source.lines.iter().enumerate().skip(start + 1) {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if leading_spaces(line) < body {
                        break;
                    }
                    last = idx;
                }
            }
            for kind in kinds.iter_mut().take(last + 1).skip(start + 1) {
                *kind = LineKind::Opaque;
            }
            trailing.retain(|(idx, _)| *idx <= start || *idx > last);
        }

        let mut first_entry = HashMap::new();
        for (idx, entry) in builder.entries.iter().enumerate() {
            first_entry.entry(entry.line).or_insert(idx);
        }

        Self {
            kinds,
            trailing,
            builder,
            first_entry,
        }
    }

    /// Attaches every comment and returns how many were placed.
    fn run(&self) -> usize {
        let mut placed = 0;
        for (line, text) in &self.trailing {
            if let Some(node) = self.builder.inline.get(line) {
                append_comment(&mut node.borrow_mut().line_comment, text);
                placed += 1;
            }
        }

        let mut prev_content = None;
        let mut i = 0;
        while i < self.kinds.len() {
            match self.kinds[i] {
                LineKind::Comment { .. } => {
                    let mut end = i;
                    while end < self.kinds.len()
                        && matches!(self.kinds[end], LineKind::Comment { .. } | LineKind::Blank)
                    {
                        end += 1;
                    }
                    let next = match self.kinds.get(end) {
                        Some(LineKind::Content { .. }) => Some(end),
                        _ => None,
                    };
                    placed += self.place_run(i, end, prev_content, next);
                    i = end;
                }
                LineKind::Content { .. } => {
                    prev_content = Some(i);
                    i += 1;
                }
                LineKind::Marker => {
                    prev_content = None;
                    i += 1;
                }
                LineKind::Blank | LineKind::Opaque => i += 1,
            }
        }
        placed
    }

    fn document_of(&self, line: usize) -> usize {
        self.builder
            .document_starts
            .partition_point(|&start| start <= line)
            .saturating_sub(1)
    }

    /// Joins lines `from..=to` into a comment, blank lines kept as empty lines.
    fn text(&self, from: usize, to: usize) -> String {
        (from..=to)
            .map(|idx| match &self.kinds[idx] {
                LineKind::Comment { text, .. } => text.as_str(),
                _ => "",
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_blank(&self, idx: usize) -> bool {
        self.kinds[idx] == LineKind::Blank
    }

    fn indent(&self, idx: usize) -> usize {
        match self.kinds[idx] {
            LineKind::Comment { indent, .. } | LineKind::Content { indent } => indent,
            _ => 0,
        }
    }

    fn entry_on(&self, line: usize) -> Option<&NodeRef> {
        self.first_entry
            .get(&line)
            .map(|&idx| &self.builder.entries[idx].node)
    }

    fn place_run(
        &self,
        start: usize,
        end: usize,
        prev: Option<usize>,
        next: Option<usize>,
    ) -> usize {
        let Some(last) = (start..end).rev().find(|&idx| !self.is_blank(idx)) else {
            return 0;
        };
        let document = self.document_of(prev.unwrap_or(start));
        let Some(doc) = self
            .builder
            .documents
            .get(document)
            .or_else(|| self.builder.documents.last())
        else {
            return 0;
        };

        let Some(prev) = prev else {
            let next_target = next.and_then(|n| {
                self.entry_on(n)
                    .or_else(|| self.builder.inline.get(&n))
                    .cloned()
            });
            let gap_after = last + 1 < end;
            match next_target {
                Some(target) if !gap_after => {
                    match (start..=last).rev().find(|&idx| self.is_blank(idx)) {
                        Some(blank) => {
                            let head_end = (start..blank)
                                .rev()
                                .find(|&idx| !self.is_blank(idx))
                                .unwrap_or(start);
                            doc.borrow_mut().head_comment = self.text(start, head_end);
                            target.borrow_mut().head_comment = self.text(blank + 1, last);
                        }
                        None => target.borrow_mut().head_comment = self.text(start, last),
                    }
                }
                _ => doc.borrow_mut().head_comment = self.text(start, last),
            }
            return 1;
        };

        let mut text = self.text(start, last);
        if start > prev + 1 && self.is_blank(start - 1) {
            text.insert(0, '\n');
        }
        let indent = self.indent(start);

        if let Some(target) = next
            .filter(|&n| indent <= self.indent(n))
            .and_then(|n| self.entry_on(n))
        {
            append_comment(&mut target.borrow_mut().head_comment, &text);
            return 1;
        }

        let owner = self
            .builder
            .entries
            .iter()
            .rev()
            .find(|e| e.line < start && e.document == document && e.indent <= indent);
        match owner {
            Some(entry) => append_comment(&mut entry.node.borrow_mut().foot_comment, &text),
            None => append_comment(&mut doc.borrow_mut().foot_comment, &text),
        }
        1
    }
}

fn is_marker(line: &str) -> bool {
    if line.starts_with('%') {
        return true;
    }
    ["---", "..."].iter().any(|marker| {
        line.strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

fn append_comment(slot: &mut String, text: &str) {
    if slot.is_empty() {
        slot.push_str(text);
    } else {
        slot.push('\n');
        slot.push_str(text);
    }
}
