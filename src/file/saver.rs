//! YAML file saving.
//!
//! Documents are encoded in memory, checked by decoding the result again,
//! and only then written. The write goes to a temporary file that is renamed
//! over the target, so a crash never leaves a half-written file behind.

use crate::config::Config;
use crate::document::encoder::Encoder;
use crate::document::parser::parse_yaml_documents;
use crate::editor::Document;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Encodes `docs` as one YAML stream.
///
/// Documents after the first are separated by `---`.
pub fn encode_documents(docs: &[Document], indent: usize) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.set_indent(indent);
    for doc in docs {
        doc.encode(&mut encoder)?;
    }
    Ok(encoder.into_inner())
}

/// Saves documents to a file, with optional backup creation.
///
/// A target ending in `.gz` is written gzip-compressed.
///
/// # Examples
///
/// ```no_run
/// use yamlgraft::config::Config;
/// use yamlgraft::file::saver::save_yaml_file;
/// use yamlgraft::Document;
///
/// let doc = Document::parse("replicas: 3\n").unwrap();
/// save_yaml_file("out.yaml", &[doc], &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The encoded output does not decode again
/// - Backup creation fails (if requested)
/// - Writing or renaming the temp file fails
pub fn save_yaml_file<P: AsRef<Path>>(path: P, docs: &[Document], config: &Config) -> Result<()> {
    let path = path.as_ref();
    let should_compress = path.to_string_lossy().ends_with(".gz");

    let mut output = encode_documents(docs, config.indent_size)?;

    let decoded = std::str::from_utf8(&output)
        .context("Generated YAML is not valid UTF-8")
        .and_then(|text| {
            parse_yaml_documents(text).context("Generated YAML does not parse back")
        })?;
    if decoded.len() != docs.len() {
        anyhow::bail!(
            "Generated YAML holds {} documents instead of {}",
            decoded.len(),
            docs.len()
        );
    }

    if config.preserve_trailing_newline && path.exists() {
        if let Some(false) = original_ends_with_newline(path, should_compress) {
            while output.last() == Some(&b'\n') {
                output.pop();
            }
        }
    }

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    write_file_atomic(path, &output, should_compress)?;
    info!(
        path = %path.display(),
        documents = docs.len(),
        bytes = output.len(),
        "saved YAML file"
    );
    Ok(())
}

/// Whether the file currently at `path` ends with a newline. Empty or
/// unreadable files yield `None`.
fn original_ends_with_newline(path: &Path, compressed: bool) -> Option<bool> {
    let bytes = if compressed {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let mut out = Vec::new();
        GzDecoder::new(fs::File::open(path).ok()?)
            .read_to_end(&mut out)
            .ok()?;
        out
    } else {
        fs::read(path).ok()?
    };
    bytes.last().map(|&b| b == b'\n')
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, &backup_path).context("Failed to create backup")?;
    info!(backup = %backup_path.display(), "created backup");
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}
