//! YAML file loading.

use crate::editor::Document;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads every document of a YAML file.
///
/// Files ending in `.gz` are decompressed first.
///
/// # Examples
///
/// ```no_run
/// use yamlgraft::file::loader::load_yaml_file;
///
/// let docs = load_yaml_file("deployment.yaml").unwrap();
/// println!("{} documents", docs.len());
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read or decompressed
/// - The contents are not valid YAML
/// - The file holds no document at all
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read {}", path_ref.display()))?
    };

    let docs = parse_yaml_content(&content)
        .with_context(|| format!("Failed to parse {}", path_ref.display()))?;
    info!(path = %path_ref.display(), documents = docs.len(), "loaded YAML file");
    Ok(docs)
}

/// Loads every document from standard input.
///
/// Gzip input is detected by its magic bytes.
pub fn load_yaml_from_stdin() -> Result<Vec<Document>> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let docs = parse_yaml_bytes(buffer).context("Failed to parse YAML from stdin")?;
    info!(documents = docs.len(), "loaded YAML from stdin");
    Ok(docs)
}

/// Decodes raw bytes, gunzipping them first when they start with the gzip
/// magic bytes (0x1f 0x8b).
pub fn parse_yaml_bytes(bytes: Vec<u8>) -> Result<Vec<Document>> {
    let content = if bytes.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&bytes)?
    } else {
        String::from_utf8(bytes).context("Invalid UTF-8 in input")?
    };
    parse_yaml_content(&content)
}

/// Decodes a YAML stream, requiring at least one document.
pub fn parse_yaml_content(content: &str) -> Result<Vec<Document>> {
    let docs = Document::parse_all(content)?;
    if docs.is_empty() {
        anyhow::bail!("No YAML document found");
    }
    Ok(docs)
}

fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped input")?;
    Ok(content)
}
