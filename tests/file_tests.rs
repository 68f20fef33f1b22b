//! Integration tests for file loading and saving.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use tempfile::{NamedTempFile, TempDir};
use yamlgraft::config::Config;
use yamlgraft::file::loader::load_yaml_file;
use yamlgraft::file::saver::save_yaml_file;
use yamlgraft::path;

#[test]
fn test_load_edit_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.yaml");
    fs::write(&file, "# app settings\n\nname: demo\nreplicas: 1 # scale here\n").unwrap();

    let docs = load_yaml_file(&file).unwrap();
    assert_eq!(docs.len(), 1);
    docs[0].set_at(&path!["name"], "prod").unwrap();
    save_yaml_file(&file, &docs, &Config::default()).unwrap();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "# app settings\n\nname: prod\nreplicas: 1 # scale here\n"
    );
}

#[test]
fn test_load_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(load_yaml_file(dir.path().join("nope.yaml")).is_err());
}

#[test]
fn test_load_invalid_yaml_fails() {
    let mut file = NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"a: [1, 2\n").unwrap();
    let err = load_yaml_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn test_gzip_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("data.yaml.gz");

    let docs = yamlgraft::Document::parse_all("a: 1\n---\nb: 2\n").unwrap();
    save_yaml_file(&file, &docs, &Config::default()).unwrap();

    let mut raw = String::new();
    GzDecoder::new(fs::File::open(&file).unwrap())
        .read_to_string(&mut raw)
        .unwrap();
    assert_eq!(raw, "a: 1\n---\nb: 2\n");

    let loaded = load_yaml_file(&file).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].must_get(&path!["b"]).to_int(), 2);
}

#[test]
fn test_backup_is_created_when_configured() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("x.yaml");
    fs::write(&file, "a: 1\n").unwrap();

    let docs = load_yaml_file(&file).unwrap();
    docs[0].set_at(&path!["a"], &2).unwrap();
    let config = Config {
        create_backup: true,
        ..Config::default()
    };
    save_yaml_file(&file, &docs, &config).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("x.yaml.bak")).unwrap(), "a: 1\n");
    assert_eq!(fs::read_to_string(&file).unwrap(), "a: 2\n");
}

#[test]
fn test_no_backup_by_default() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("x.yaml");
    fs::write(&file, "a: 1\n").unwrap();

    let docs = load_yaml_file(&file).unwrap();
    save_yaml_file(&file, &docs, &Config::default()).unwrap();
    assert!(!dir.path().join("x.yaml.bak").exists());
}

#[test]
fn test_save_uses_configured_indent() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("x.yaml");
    fs::write(&file, "a:\n  b: 1\n").unwrap();

    let docs = load_yaml_file(&file).unwrap();
    let config = Config {
        indent_size: 4,
        ..Config::default()
    };
    save_yaml_file(&file, &docs, &config).unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "a:\n    b: 1\n");
}
