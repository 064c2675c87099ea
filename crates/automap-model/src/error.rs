//! Errors raised while invoking described operations.

use thiserror::Error;

/// Failure of a single invoked operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// A null value reached a slot that cannot hold null.
    #[error("null cannot be converted to {expected}")]
    NullValue { expected: &'static str },

    /// The value has another shape than the slot expects.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// The receiver handed to the operation is not of the owning type.
    #[error("receiver is not a {expected}")]
    WrongReceiver { expected: &'static str },

    /// The operation was declared for shape only, or invoked the wrong way.
    #[error("operation '{name}' cannot be invoked as a {shape}")]
    NotInvocable { name: String, shape: &'static str },

    /// The operation body itself reported a failure.
    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    /// Convenience constructor for failures raised by user code.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type Result<T> = std::result::Result<T, InvokeError>;
