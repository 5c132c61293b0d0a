//! Operation Outcome
//!
//! The value-or-error payload handed to an operation's completion point.
//! An outcome that was never set is `Undefined` and observes as `Null`.

use crate::error::Error;
use crate::value::{write_quoted, Value};
use std::fmt;

/// Discriminant of an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeType {
    Undefined,
    Value,
    Error,
}

impl OutcomeType {
    pub const fn name(self) -> &'static str {
        match self {
            OutcomeType::Undefined => "Undefined",
            OutcomeType::Value => "Value",
            OutcomeType::Error => "Error",
        }
    }
}

/// Exactly one of a value or an error, once set
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outcome {
    #[default]
    Undefined,
    Value(Value),
    Error(Error),
}

impl Outcome {
    pub fn outcome_type(&self) -> OutcomeType {
        match self {
            Outcome::Undefined => OutcomeType::Undefined,
            Outcome::Value(_) => OutcomeType::Value,
            Outcome::Error(_) => OutcomeType::Error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.outcome_type().name()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Outcome::Undefined)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Replace the current state
    pub fn set(&mut self, outcome: impl Into<Outcome>) {
        *self = outcome.into();
    }

    /// Take over whichever state `other` holds, without inspecting it
    pub fn set_from(&mut self, other: &Outcome) {
        *self = other.clone();
    }

    /// Observe as a `Result`; an undefined outcome observes as `Null`
    pub fn into_result(self) -> Result<Value, Error> {
        match self {
            Outcome::Undefined => Ok(Value::Null),
            Outcome::Value(value) => Ok(value),
            Outcome::Error(error) => Err(error),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<Error> for Outcome {
    fn from(error: Error) -> Self {
        Outcome::Error(error)
    }
}

impl From<Result<Value, Error>> for Outcome {
    fn from(result: Result<Value, Error>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(error) => Outcome::Error(error),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name())?;
        match self {
            Outcome::Undefined => {}
            Outcome::Value(value) => fmt::Display::fmt(value, f)?,
            Outcome::Error(error) => write_quoted(f, error.message())?,
        }
        f.write_str(")")
    }
}
