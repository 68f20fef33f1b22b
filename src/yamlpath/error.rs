//! Errors for textual path expressions.

use thiserror::Error;

/// Ways a path expression can fail to parse. Positions count characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlPathError {
    #[error("unexpected '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: String,
    },

    #[error("unexpected end of path, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("invalid path syntax: {message}")]
    InvalidSyntax { message: String },
}
