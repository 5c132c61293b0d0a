//! Error Types
//!
//! Every failure that crosses a promise boundary is an [`Error`]: an opaque,
//! human-readable message with no structured code. Lower layers describe
//! their failures with typed enums (see [`ValueError`]) and convert into
//! [`Error`] at the boundary.

use std::fmt;
use thiserror::Error as ThisError;

/// Message-only error carried by an [`Outcome`](crate::Outcome)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Error {
    message: String,
}

impl Error {
    /// Create an error from a descriptive message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The descriptive message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Consume the error and return its message
    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failures raised while extracting typed data from values
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Positional argument is missing
    #[error("invalid index in argument {index}")]
    InvalidIndex { index: usize },

    /// Positional argument holds a different type
    #[error("invalid cast in argument {index} from type {from} to {to}")]
    InvalidArgumentCast {
        index: usize,
        from: &'static str,
        to: &'static str,
    },

    /// Map entry holds a different type
    #[error("invalid cast in key {key} from type {from} to {to}")]
    InvalidKeyCast {
        key: String,
        from: &'static str,
        to: &'static str,
    },

    /// Map entry is missing
    #[error("invalid key {key}")]
    InvalidKey { key: String },

    /// Argument list has the wrong length
    #[error("expected {expected} arguments but {given} were given")]
    Arity { expected: usize, given: usize },
}

impl From<ValueError> for Error {
    fn from(err: ValueError) -> Self {
        Error::new(err.to_string())
    }
}
