//! Planned permission operations.
//!
//! A plan is the ordered list of grant and revoke calls that takes a role
//! from its prior permission set to the desired one. Planning is pure; the
//! reconciler executes the plan against a directory.
//!
//! The plan always revokes every prior permission before granting every
//! desired one, even when the two sets are equal. The store rejects a grant
//! of something already held, so clearing first keeps every grant valid.

use std::fmt;

use serde::{Deserialize, Serialize};

use etcd_reconcile_core::{PermissionClass, PermissionSet};

/// Direction of a single permission call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleAction {
    Revoke,
    Grant,
}

impl fmt::Display for RoleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revoke => f.write_str("revoke"),
            Self::Grant => f.write_str("grant"),
        }
    }
}

/// One remote call: grant or revoke `class` on a single `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleOp {
    pub action: RoleAction,
    pub path: String,
    pub class: PermissionClass,
}

impl RoleOp {
    pub fn grant(path: impl Into<String>, class: PermissionClass) -> Self {
        Self {
            action: RoleAction::Grant,
            path: path.into(),
            class,
        }
    }

    pub fn revoke(path: impl Into<String>, class: PermissionClass) -> Self {
        Self {
            action: RoleAction::Revoke,
            path: path.into(),
            class,
        }
    }
}

impl fmt::Display for RoleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.action, self.path, self.class)
    }
}

/// Build the op sequence from `prior` to `desired`.
///
/// Revoke phase first, covering every classified prior entry in insertion
/// order, then the grant phase for every classified desired entry. Entries
/// with neither flag set produce nothing.
pub fn plan(prior: &PermissionSet, desired: &PermissionSet) -> Vec<RoleOp> {
    let revokes = prior
        .classified()
        .map(|(entry, class)| RoleOp::revoke(entry.path.clone(), class));
    let grants = desired
        .classified()
        .map(|(entry, class)| RoleOp::grant(entry.path.clone(), class));
    revokes.chain(grants).collect()
}

/// Counts of calls issued by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub revoked: usize,
    pub granted: usize,
}

impl ReconcileReport {
    pub(crate) fn record(&mut self, op: &RoleOp) {
        match op.action {
            RoleAction::Revoke => self.revoked += 1,
            RoleAction::Grant => self.granted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.revoked + self.granted
    }
}
