//! Runtime Error Types
//!
//! Dispatch-level failures. Each converts into a message-only
//! [`types::Error`] before it reaches a promise.

use thiserror::Error;

/// Failures produced by the runtime itself rather than by operation logic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Mailbox received a name with no registered function
    #[error("no such actor method {name}")]
    UnknownOperation { name: String },

    /// A function or continuation panicked on a worker
    #[error("{context} panicked: {message}")]
    Panicked {
        context: &'static str,
        message: String,
    },

    /// Group path is not of the form `member/method`
    #[error("invalid path {path}")]
    InvalidPath { path: String },

    /// Group has no member with this name
    #[error("no such group member {member}")]
    UnknownMember { member: String },

    /// Registry has no factory with this name
    #[error("no such actor factory {name}")]
    UnknownFactory { name: String },
}

impl DispatchError {
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    pub fn panicked(context: &'static str, message: impl Into<String>) -> Self {
        Self::Panicked {
            context,
            message: message.into(),
        }
    }
}

impl From<DispatchError> for types::Error {
    fn from(err: DispatchError) -> Self {
        types::Error::new(err.to_string())
    }
}

/// Extract the message carried by a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into a [`DispatchError::Panicked`]
pub(crate) fn catch_panic<R>(context: &'static str, f: impl FnOnce() -> R) -> Result<R, DispatchError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
        .map_err(|payload| DispatchError::panicked(context, panic_message(payload.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operation_message() {
        let error: types::Error = DispatchError::unknown_operation("withdraw").into();
        assert_eq!(error.message(), "no such actor method withdraw");
    }

    #[test]
    fn test_catch_panic() {
        let caught = catch_panic("function", || -> i32 { panic!("boom") });
        assert_eq!(
            caught.unwrap_err().to_string(),
            "function panicked: boom"
        );
        assert_eq!(catch_panic("function", || 7).unwrap(), 7);
    }
}
