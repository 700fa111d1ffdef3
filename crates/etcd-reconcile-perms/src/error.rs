//! Error types for the reconciliation module.

use thiserror::Error;

use etcd_reconcile_core::{Interrupted, PermissionClass, ValidationError};
use etcd_reconcile_store::StoreError;

use crate::op::RoleAction;

/// Errors that can occur while reconciling a role or a user.
///
/// Nothing is rolled back on failure: calls issued before the failing one
/// stay applied, and the next reconciliation starts from whatever the store
/// then reports.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A permission grant or revoke was rejected by the store.
    #[error("{action} of {class} on {path:?} for role {role:?} failed: {source}")]
    RemoteCall {
        role: String,
        action: RoleAction,
        path: String,
        class: PermissionClass,
        #[source]
        source: StoreError,
    },

    /// Any other store call (lifecycle, read-back, membership).
    #[error("{step} for {kind} {name:?} failed: {source}")]
    Call {
        kind: &'static str,
        name: String,
        step: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("operation cancelled before {step}")]
    Cancelled { step: &'static str },

    #[error("operation deadline exceeded before {step}")]
    DeadlineExceeded { step: &'static str },

    /// The identifying name changed; the entity must be deleted and recreated.
    #[error("{kind} name changed from {from:?} to {to:?}; replacement required")]
    RequiresReplacement {
        kind: &'static str,
        from: String,
        to: String,
    },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ReconcileError {
    pub(crate) fn call(
        kind: &'static str,
        name: impl Into<String>,
        step: &'static str,
        source: StoreError,
    ) -> Self {
        Self::Call {
            kind,
            name: name.into(),
            step,
            source,
        }
    }

    pub(crate) fn interrupted(reason: Interrupted, step: &'static str) -> Self {
        match reason {
            Interrupted::Cancelled => Self::Cancelled { step },
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded { step },
        }
    }

    /// The store error behind this failure, if a remote call was made.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::RemoteCall { source, .. } | Self::Call { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, ReconcileError>;
