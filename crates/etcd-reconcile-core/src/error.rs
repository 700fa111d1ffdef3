//! Error types for the reconciliation core.

use thiserror::Error;

/// Errors raised when a declared value breaks a model invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("permission path must not be empty")]
    EmptyPath,

    #[error("permission path {0:?} is declared more than once")]
    DuplicatePath(String),

    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("password for user {0:?} must not be empty")]
    EmptyPassword(String),

    #[error("key must not be empty")]
    EmptyKey,
}

/// Why an operation stopped at a checkpoint before issuing a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}
