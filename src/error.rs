//! Error types for reading and editing YAML trees.

use std::fmt;

use thiserror::Error;

use crate::document::node::NodeKind;
use crate::yamlpath::{Path, Step};

pub type Result<T> = std::result::Result<T, Error>;

/// Why a lookup stopped before reaching its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCause {
    /// The container has no such key or index.
    StepNotFound,
    /// A string step met something other than a mapping.
    NotAMapping,
    /// An integer step met something other than a sequence.
    NotASequence,
}

impl fmt::Display for NotFoundCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundCause::StepNotFound => f.write_str("no such key or index"),
            NotFoundCause::NotAMapping => f.write_str("node is not a mapping"),
            NotFoundCause::NotASequence => f.write_str("node is not a sequence"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid path: {}", .0.join("; "))]
    InvalidPath(Vec<String>),

    #[error("{cause} at {path}")]
    NotFound { path: Path, cause: NotFoundCause },

    #[error("cannot change {existing} into {requested} at {path}, use a replace operation instead")]
    IncompatibleKind {
        path: Path,
        existing: NodeKind,
        requested: NodeKind,
    },

    #[error("YAML serialization failed: {0}")]
    Serde(#[from] serde_yaml::Error),

    #[error("YAML syntax error: {0}")]
    Syntax(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true for every "could not find it" failure, regardless of cause.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Prepends `step` to the position carried by the error.
    ///
    /// Errors without a position pass through unchanged.
    pub fn at(self, step: &Step) -> Self {
        match self {
            Error::NotFound { path, cause } => Error::NotFound {
                path: path.prepend([step.clone()]),
                cause,
            },
            Error::IncompatibleKind {
                path,
                existing,
                requested,
            } => Error::IncompatibleKind {
                path: path.prepend([step.clone()]),
                existing,
                requested,
            },
            other => other,
        }
    }

    /// The position the error refers to, if it carries one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::NotFound { path, .. } | Error::IncompatibleKind { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::Syntax(err.to_string())
    }
}
