//! Error types for the store module.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors a directory call can return.
///
/// Reconcilers treat every variant as fatal to the current operation; the
/// split exists so callers and logs can tell a missing entity from a
/// transport problem.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed role, user or key does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The store refused a write that conflicts with existing state.
    #[error("conflict on {kind} {name}: {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a body we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The store could not be reached for this call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn conflict(
        kind: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
