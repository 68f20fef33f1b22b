//! File I/O for YAML documents.
//!
//! This module loads YAML streams from disk or stdin, and saves edited
//! documents back with atomic writes and optional backups. Paths ending in
//! `.gz` are compressed and decompressed transparently.

pub mod loader;
pub mod saver;
