//! Configuration for the yamlgraft command-line tool.
//!
//! Settings are read from `~/.config/yamlgraft/config.toml`. Every field is
//! optional in the file and falls back to its default.
//!
//! # Example
//!
//! ```
//! use yamlgraft::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.indent_size, 2);
//!
//! let custom = Config {
//!     indent_size: 4,
//!     ..Config::default()
//! };
//! assert!(!custom.create_backup);
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for reading and writing YAML files.
///
/// # Fields
///
/// * `indent_size` - Spaces per indentation level when encoding (default: 2)
/// * `create_backup` - Create .bak files before saving (default: false)
/// * `allow_kind_change` - Let `set` change a node's kind (default: false)
/// * `preserve_trailing_newline` - Keep the original file's final newline,
///   or lack of one (default: true)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,

    /// Writes may turn a scalar into a collection and the other way round
    #[serde(default)]
    pub allow_kind_change: bool,

    #[serde(default = "default_preserve_trailing_newline")]
    pub preserve_trailing_newline: bool,
}

fn default_indent_size() -> usize {
    2
}

fn default_preserve_trailing_newline() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            create_backup: false,
            allow_kind_change: false,
            preserve_trailing_newline: default_preserve_trailing_newline(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlgraft/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlgraft");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, with the same fallbacks as `load`.
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
