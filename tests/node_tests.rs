//! Integration tests for path-addressed reads and writes.

use serde::Deserialize;
use yamlgraft::document::NodeKind;
use yamlgraft::{path, Document, Error, NotFoundCause};

fn load(input: &str) -> Document {
    Document::parse(input).unwrap()
}

fn render(doc: &Document) -> String {
    String::from_utf8(doc.bytes(2).unwrap()).unwrap()
}

#[test]
fn test_get_object_key() {
    let doc = load("string: bar\nnumber: 12\nlist: [1, 2, 3]\nobject:\n  key: value");

    assert_eq!(doc.get(&path!["string"]).unwrap().to_string(), "bar");
    assert_eq!(doc.get(&path!["number"]).unwrap().to_int(), 12);

    #[derive(Deserialize)]
    struct Dummy {
        key: String,
    }
    let object = doc.get(&path!["object"]).unwrap();
    let dummy: Dummy = object.to().unwrap();
    assert_eq!(dummy.key, "value");
    assert_eq!(object.to_map().len(), 1);

    assert_eq!(doc.must_get(&path!["nonexisting"]).to_string(), "");
    assert_eq!(doc.must_get(&path!["list"]).to_slice().len(), 3);
}

#[test]
fn test_get_array_item() {
    let doc = load("list: [1, foo, 2]");
    let list = doc.get(&path!["list"]).unwrap();

    assert_eq!(list.get(&path![0]).unwrap().to_int(), 1);
    assert_eq!(list.must_get(&path![1]).to_string(), "foo");
    assert_eq!(list.must_get(&path![3]).to_string(), "");
}

#[test]
fn test_get_deep() {
    let doc = load(
        "foo:\n  bar:\n    - hello\n    - key: value\n      anotherkey:\n        - first\n        - second\n        - hello: world",
    );
    let item = doc.get(&path!["foo", "bar", 1, "anotherkey", 1]).unwrap();
    assert_eq!(item.to_string(), "second");
}

#[test]
fn test_scalar_cannot_get_keys() {
    let doc = load("\"hello world\"");
    assert!(doc.get(&path!["list"]).is_none());
    assert_eq!(doc.must_get(&path!["list"]).kind(), NodeKind::Scalar);

    let doc = load("foo: \"bar\"");
    assert!(doc.get(&path!["foo", "sub", "bar"]).is_none());
    let err = doc.lookup(&path!["foo", "sub", "bar"]).unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            cause: NotFoundCause::NotAMapping,
            ..
        }
    ));
}

#[test]
fn test_lookup_distinguishes_causes() {
    let doc = load("list: [a]\nmap: {k: v}");
    let cause = |steps: yamlgraft::Path| match doc.lookup(&steps).unwrap_err() {
        Error::NotFound { cause, .. } => cause,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(cause(path!["list", 5]), NotFoundCause::StepNotFound);
    assert_eq!(cause(path!["list", "k"]), NotFoundCause::NotAMapping);
    assert_eq!(cause(path!["map", 0]), NotFoundCause::NotASequence);
    assert_eq!(cause(path!["missing"]), NotFoundCause::StepNotFound);
}

#[test]
fn test_delete_key() {
    let doc = load(
        "foo:\n  bar:\n    - hello\n    - key: value\n      anotherkey:\n        - first\n        - second\n        - hello: world",
    );
    doc.delete_key(&path!["foo", "bar", 1, "anotherkey", 1])
        .unwrap();
    assert_eq!(
        render(&doc),
        "foo:\n  bar:\n    - hello\n    - key: value\n      anotherkey:\n        - first\n        - hello: world\n"
    );

    doc.delete_key(&path!["foo", "bar", 1, "key"]).unwrap();
    doc.delete_key(&path!["foo", "bar", 0]).unwrap();
    assert_eq!(
        render(&doc),
        "foo:\n  bar:\n    - anotherkey:\n        - first\n        - hello: world\n"
    );
}

#[test]
fn test_delete_missing_is_a_no_op() {
    let doc = load("a: 1\nlist: [x]");
    doc.delete_key(&path!["nope"]).unwrap();
    doc.delete_key(&path!["nope", "deeper"]).unwrap();
    doc.delete_key(&path!["list", 7]).unwrap();
    doc.delete_key(&path!["a", "b"]).unwrap();
    assert_eq!(render(&doc), "a: 1\nlist: [x]\n");

    assert!(matches!(
        doc.delete_key(&path!["list", -1]),
        Err(Error::InvalidPath(_))
    ));
}

#[test]
fn test_allow_set_any_node_to_null() {
    let doc = load("foo: bar\nhello: world\nlist: [1, 2, 3]\nobj: {key: value}");
    let none = Option::<u8>::None;

    doc.set_key("foo", &none).unwrap();
    doc.set_key("list", &none).unwrap();
    doc.set_key("obj", &none).unwrap();

    assert_eq!(
        render(&doc),
        "foo: null\nhello: world\nlist: null\nobj: null\n"
    );
}

#[test]
fn test_allow_set_null_nodes_to_anything() {
    let doc = load("str: null\nlist: null\nobj: null");

    doc.set_key("str", "foo").unwrap();
    doc.set_key("list", &vec![1, 2, 3]).unwrap();
    let mut obj = std::collections::BTreeMap::new();
    obj.insert("foo", 1);
    doc.set_key("obj", &obj).unwrap();

    assert_eq!(
        render(&doc),
        "str: foo\nlist:\n  - 1\n  - 2\n  - 3\nobj:\n  foo: 1\n"
    );
}

#[test]
fn test_forbid_kind_change() {
    let doc = load("foo: bar\nhello: world\nlist: [1, 2, 3]\nobj: {key: value}");

    assert!(matches!(
        doc.set_key("foo", &vec!["foo", "bar"]),
        Err(Error::IncompatibleKind { .. })
    ));
    assert!(doc.set_key("list", "foo").is_err());
    assert!(doc.set_key("obj", "foo").is_err());
    doc.set_key("list", &vec!["foo", "bar"]).unwrap();

    assert_eq!(
        render(&doc),
        "foo: bar\nhello: world\nlist:\n  - foo\n  - bar\nobj: {key: value}\n"
    );
}

#[test]
fn test_incompatible_kind_reports_position() {
    let doc = load("foo: bar");
    match doc.set_key("foo", &vec![1]).unwrap_err() {
        Error::IncompatibleKind {
            path,
            existing,
            requested,
        } => {
            assert_eq!(path, path!["foo"]);
            assert_eq!(existing, NodeKind::Scalar);
            assert_eq!(requested, NodeKind::Sequence);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_allow_replacing_kinds() {
    let doc = load("str: foo\nlist: [1, 2, 3]\nobj: {key: value}");

    doc.replace_key("str", &vec!["foo", "bar"]).unwrap();
    doc.replace_key("list", "foo").unwrap();
    doc.replace_key("obj", "foo").unwrap();
    doc.must_get(&path!["obj"]).replace(&vec![1, 2]).unwrap();

    assert_eq!(
        render(&doc),
        "str:\n  - foo\n  - bar\nlist: foo\nobj:\n  - 1\n  - 2\n"
    );
}

#[test]
fn test_set_at_creates_missing_containers() {
    let doc = load("a: 1");
    doc.set_at(&path!["b", "c", 1, "d"], "x").unwrap();
    assert_eq!(render(&doc), "a: 1\nb:\n  c:\n    - null\n    - d: x\n");
    assert_eq!(doc.must_get(&path!["b", "c", 1, "d"]).to_string(), "x");
}

#[test]
fn test_set_at_returns_the_written_node() {
    let doc = load("a:\n  x: 1");
    let written = doc.set_at(&path!["a", "b"], "first").unwrap();
    written.set_line_comment("written");
    assert_eq!(render(&doc), "a:\n  x: 1\n  b: first # written\n");
}

#[test]
fn test_set_at_validates_before_writing() {
    let doc = load("a: 1");
    let err = doc.set_at(&path!["b", -1, "c", -4], "x").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid path: -1 is invalid, steps must be >= 0; -4 is invalid, steps must be >= 0"
    );
    assert_eq!(render(&doc), "a: 1\n");
}

#[test]
fn test_set_with_empty_path_is_rejected() {
    let doc = load("a: 1");
    assert!(matches!(
        doc.set_at(&path![], "x"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        doc.lookup(&path![]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(doc.get(&path![]).is_none());
}

#[test]
fn test_set_keeps_node_identity() {
    let doc = load("a: 1\nb: 2");
    let handle = doc.must_get(&path!["a"]);
    handle.set(&5).unwrap();
    assert_eq!(doc.must_get(&path!["a"]).to_int(), 5);
    assert_eq!(render(&doc), "a: 5\nb: 2\n");
}

#[test]
fn test_value_comments() {
    let doc = load("foo:\n  # this is a comment\n  hello: world");

    doc.must_get(&path!["foo", "hello"])
        .set_head_comment("new head comment")
        .set_line_comment("new line comment")
        .set_foot_comment("new foot comment");

    assert_eq!(
        render(&doc),
        "foo:\n  # this is a comment\n  hello:\n    # new head comment\n    world # new line comment\n    # new foot comment\n"
    );
}

#[test]
fn test_key_comments() {
    let doc = load("foo:\n  # this is a comment\n  hello: world");

    let key = doc.get_key(&path!["foo", "hello"]).unwrap();
    assert_eq!(key.head_comment(), "# this is a comment");
    key.set_head_comment("new head comment")
        .set_line_comment("new line comment")
        .set_foot_comment("new foot comment");

    assert_eq!(
        render(&doc),
        "foo:\n  # new head comment\n  hello: world # new line comment\n  # new foot comment\n"
    );
}

#[test]
fn test_get_key_requires_a_mapping_key() {
    let doc = load("list: [a, b]\nmap: {k: v}");
    assert!(doc.get_key(&path!["list", 0]).is_none());
    assert!(doc.get_key(&path!["map", "missing"]).is_none());
    assert!(doc.get_key(&path![]).is_none());
    assert_eq!(doc.get_key(&path!["map", "k"]).unwrap().to_string(), "k");
}
