//! Integration tests for the document wrapper.

use std::collections::BTreeMap;

use serde::Deserialize;
use yamlgraft::document::NodeKind;
use yamlgraft::{path, Document, Error};

fn render(doc: &Document) -> String {
    String::from_utf8(doc.bytes(2).unwrap()).unwrap()
}

#[test]
fn test_idempotent() {
    let input = "# hello world\n\nfoo: bar\nlist: [1, 2, 3]";
    let doc = Document::parse(input).unwrap();
    assert_eq!(render(&doc), format!("{}\n", input));
}

#[test]
fn test_from_reader() {
    let doc = Document::from_reader("a:\n  b: 1\n".as_bytes()).unwrap();
    assert_eq!(doc.must_get(&path!["a", "b"]).to_int(), 1);

    assert!(matches!(
        Document::from_reader("".as_bytes()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_syntax_error() {
    assert!(matches!(
        Document::parse("a: [unclosed\n"),
        Err(Error::Syntax(_))
    ));
}

#[test]
fn test_root_tracks_replacement() {
    let doc = Document::parse("a: 1\n").unwrap();
    assert_eq!(doc.root().unwrap().kind(), NodeKind::Mapping);

    doc.replace("just text").unwrap();
    assert_eq!(doc.root().unwrap().kind(), NodeKind::Scalar);
    assert_eq!(render(&doc), "just text\n");

    assert!(doc.set(&vec![1]).is_err());
}

#[test]
fn test_flow_collections_stay_flow() {
    let doc = Document::parse("a: {}\nb: [x]\n").unwrap();
    doc.set_at(&path!["a", "k"], &1).unwrap();
    doc.set_at(&path!["b", 1], "y").unwrap();
    assert_eq!(render(&doc), "a: {k: 1}\nb: [x, y]\n");
}

#[test]
fn test_document_comments() {
    let doc = Document::parse("a: 1\n").unwrap();
    doc.set_document_head_comment("generated file")
        .set_document_foot_comment("end");
    assert_eq!(doc.document_head_comment(), "generated file");
    assert_eq!(render(&doc), "# generated file\n\na: 1\n# end\n");

    let reparsed = Document::parse(&render(&doc)).unwrap();
    assert_eq!(reparsed.document_head_comment(), "# generated file");
}

#[test]
fn test_root_comments() {
    let doc = Document::parse("a: 1\n").unwrap();
    doc.set_head_comment("about the root");
    assert_eq!(doc.head_comment(), "about the root");
    assert_eq!(doc.document_head_comment(), "");
    assert_eq!(render(&doc), "# about the root\na: 1\n");
}

#[test]
fn test_indent_argument_is_honored() {
    let doc = Document::parse("a:\n  b:\n    - c: 1\n").unwrap();
    let out = String::from_utf8(doc.bytes(4).unwrap()).unwrap();
    assert_eq!(out, "a:\n    b:\n        - c: 1\n");
}

#[test]
fn test_to_typed_value() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Server {
        host: String,
        port: u16,
        tls: bool,
    }

    let doc = Document::parse("host: example.com\nport: 443\ntls: true\n").unwrap();
    let server: Server = doc.to().unwrap();
    assert_eq!(
        server,
        Server {
            host: "example.com".to_string(),
            port: 443,
            tls: true,
        }
    );
}

#[test]
fn test_node_serializes_through_serde() {
    let doc = Document::parse("a: 1\nb: [x, true, 2.5, ~]\n").unwrap();
    let json = serde_json::to_string(&doc.root().unwrap()).unwrap();
    assert_eq!(json, r#"{"a":1,"b":["x",true,2.5,null]}"#);
}

#[test]
fn test_aliases_serialize_their_target() {
    let doc = Document::parse("base: &b\n  x: 1\nref: *b\n").unwrap();
    let json = serde_json::to_string(&doc.root().unwrap()).unwrap();
    assert_eq!(json, r#"{"base":{"x":1},"ref":{"x":1}}"#);
    assert_eq!(render(&doc), "base: &b\n  x: 1\nref: *b\n");
}

#[test]
fn test_explicit_str_tag_becomes_quotes() {
    let doc = Document::parse("v: !!str 123\nw: !custom x\n").unwrap();
    assert_eq!(render(&doc), "v: '123'\nw: !custom x\n");
}

#[test]
#[should_panic]
fn test_generic_serialization_panics() {
    let doc = Document::parse("a: 1\n").unwrap();
    let _ = serde_json::to_string(&doc);
}

#[test]
fn test_values_written_with_set_at_read_back() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Written {
        colon: String,
        hash: String,
        bool_text: String,
        int_text: String,
        null_text: String,
        empty: String,
        dash: String,
        padded: String,
        lines: String,
        ratio: f64,
        negative: f64,
        count: i64,
        enabled: bool,
        nested: BTreeMap<String, BTreeMap<String, String>>,
        list: Vec<String>,
    }

    let doc = Document::parse("# values\n\nseed: 0\n").unwrap();
    doc.set_at(&path!["colon"], "a: b").unwrap();
    doc.set_at(&path!["hash"], "x # y").unwrap();
    doc.set_at(&path!["bool_text"], "true").unwrap();
    doc.set_at(&path!["int_text"], "012").unwrap();
    doc.set_at(&path!["null_text"], "null").unwrap();
    doc.set_at(&path!["empty"], "").unwrap();
    doc.set_at(&path!["dash"], "- item").unwrap();
    doc.set_at(&path!["padded"], " padded ").unwrap();
    doc.set_at(&path!["lines"], "one\ntwo").unwrap();
    doc.set_at(&path!["ratio"], &0.1).unwrap();
    doc.set_at(&path!["negative"], &-2.5).unwrap();
    doc.set_at(&path!["count"], &42).unwrap();
    doc.set_at(&path!["enabled"], &false).unwrap();
    doc.set_at(&path!["nested", "inner", "key"], "yes").unwrap();
    doc.set_at(&path!["list", 1], "second").unwrap();
    doc.set_at(&path!["list", 0], "[first]").unwrap();

    let decoded = Document::parse(&render(&doc)).unwrap();
    let written: Written = decoded.to().unwrap();

    let mut inner = BTreeMap::new();
    inner.insert("key".to_string(), "yes".to_string());
    let mut nested = BTreeMap::new();
    nested.insert("inner".to_string(), inner);
    assert_eq!(
        written,
        Written {
            colon: "a: b".to_string(),
            hash: "x # y".to_string(),
            bool_text: "true".to_string(),
            int_text: "012".to_string(),
            null_text: "null".to_string(),
            empty: String::new(),
            dash: "- item".to_string(),
            padded: " padded ".to_string(),
            lines: "one\ntwo".to_string(),
            ratio: 0.1,
            negative: -2.5,
            count: 42,
            enabled: false,
            nested,
            list: vec!["[first]".to_string(), "second".to_string()],
        }
    );
    assert_eq!(decoded.document_head_comment(), "# values");
}
