//! Error types for sessions.

use etcd_reconcile_core::{Interrupted, ValidationError};
use etcd_reconcile_perms::ReconcileError;
use etcd_reconcile_store::StoreError;
use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Role or user reconciliation error.
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Operation stopped at a checkpoint.
    #[error("{0}")]
    Interrupted(#[from] Interrupted),

    /// Role not found.
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Key not found.
    #[error("key not found: {0}")]
    KeyNotFound(String),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
