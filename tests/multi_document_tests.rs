//! Multi-document streams.

use yamlgraft::document::Encoder;
use yamlgraft::file::saver::encode_documents;
use yamlgraft::{path, Document};

#[test]
fn test_parse_all_returns_every_document() {
    let docs = Document::parse_all("a: 1\n---\nb: 2\n---\nc: 3\n").unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[2].must_get(&path!["c"]).to_int(), 3);
}

#[test]
fn test_parse_returns_first_document() {
    let doc = Document::parse("a: 1\n---\nb: 2\n").unwrap();
    assert!(doc.get(&path!["a"]).is_some());
    assert!(doc.get(&path!["b"]).is_none());
}

#[test]
fn test_edit_one_document_of_many() {
    let docs = Document::parse_all("a: 1\n---\nb: 2\n---\nc: 3\n").unwrap();
    docs[1].set_at(&path!["b"], &3).unwrap();

    let out = encode_documents(&docs, 2).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a: 1\n---\nb: 3\n---\nc: 3\n"
    );
}

#[test]
fn test_comments_stay_with_their_document() {
    let input = "a: 1 # first\n---\n# about b\nb: 2\n";
    let docs = Document::parse_all(input).unwrap();
    assert_eq!(docs[0].must_get(&path!["a"]).line_comment(), "# first");
    assert_eq!(
        docs[1].get_key(&path!["b"]).unwrap().head_comment(),
        "# about b"
    );

    let out = encode_documents(&docs, 2).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), input);
}

#[test]
fn test_encoder_separates_documents() {
    let docs = Document::parse_all("- x\n---\n- y\n").unwrap();
    let mut encoder = Encoder::new(Vec::new());
    for doc in &docs {
        doc.encode(&mut encoder).unwrap();
    }
    assert_eq!(
        String::from_utf8(encoder.into_inner()).unwrap(),
        "- x\n---\n- y\n"
    );
}

#[test]
fn test_empty_documents_survive_re_encoding() {
    for input in ["---\n", "# head\n\n---\n", "a: 1\n---\n"] {
        let docs = Document::parse_all(input).unwrap();
        let out = String::from_utf8(encode_documents(&docs, 2).unwrap()).unwrap();
        let again = Document::parse_all(&out).unwrap();
        assert_eq!(again.len(), docs.len(), "{:?} -> {:?}", input, out);
    }
}
