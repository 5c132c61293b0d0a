//! Functions and access modes
//!
//! A [`Function`] is the unit registered under an operation name: an
//! immutable `(List) -> Outcome` callable that can be shared across
//! threads. Typed closures are adapted through [`FromArgs`] and
//! [`IntoOutcome`], so argument arity and type mismatches become ordinary
//! error outcomes.

use crate::error::catch_panic;
use std::fmt;
use std::sync::Arc;
use types::{FromArgs, IntoOutcome, List, Outcome};

/// Whether an operation may overlap with others on the same actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Runs concurrently with other readers, never with a writer
    Reader,
    /// Runs alone
    Writer,
}

impl Access {
    pub const fn name(self) -> &'static str {
        match self {
            Access::Reader => "reader",
            Access::Writer => "writer",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Callable = dyn Fn(List) -> Outcome + Send + Sync + 'static;

/// Shared, immutable `(argument list) -> Outcome` callable
#[derive(Clone)]
pub struct Function {
    callable: Arc<Callable>,
}

impl Function {
    /// Wrap a raw callable that handles its own argument list
    pub fn new<F>(callable: F) -> Self
    where
        F: Fn(List) -> Outcome + Send + Sync + 'static,
    {
        Self {
            callable: Arc::new(callable),
        }
    }

    /// Wrap a typed callable; arguments are unpacked and checked first
    pub fn typed<A, R, F>(callable: F) -> Self
    where
        A: FromArgs,
        R: IntoOutcome,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::new(move |arguments: List| match arguments.unpack::<A>() {
            Ok(args) => callable(args).into_outcome(),
            Err(err) => Outcome::Error(err.into()),
        })
    }

    /// Invoke on the calling thread; a panic becomes an error outcome
    pub fn call(&self, arguments: List) -> Outcome {
        match catch_panic("function", || (self.callable)(arguments)) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Error(err.into()),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}
