//! Role reconciliation.
//!
//! [`RoleReconciler`] drives a [`RoleDirectory`] from a role's prior
//! permission set to its desired one, and reads roles back into declared
//! form through [`PermissionSetCodec`].
//!
//! ## Call Sequence
//!
//! ```text
//!   create:  add_role, grant*
//!   update:  revoke* (all prior), grant* (all desired)
//!   observe: get_role
//!   delete:  remove_role
//! ```
//!
//! Every grant and revoke carries a single path. The operation context is
//! checked before each call and the first failure stops the sequence.

use tracing::{debug, info};

use etcd_reconcile_core::{validate_role, OpContext, PermissionSet, PermissionSetCodec, Role};
use etcd_reconcile_store::RoleDirectory;

use crate::error::{ReconcileError, Result};
use crate::op::{self, ReconcileReport, RoleAction, RoleOp};

/// Reconciles roles against one directory.
pub struct RoleReconciler<'a, D: RoleDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: RoleDirectory + ?Sized> RoleReconciler<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Execute `ops` against `role`, one call per op, in order.
    ///
    /// Stops at the first failure. Ops already applied are not undone.
    pub async fn apply(
        &self,
        ctx: &OpContext,
        role: &str,
        ops: &[RoleOp],
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for op in ops {
            ctx.checkpoint()
                .map_err(|reason| ReconcileError::interrupted(reason, "permission call"))?;

            debug!(role, op = %op, "Applying permission op");
            let paths = [op.path.clone()];
            let result = match op.action {
                RoleAction::Revoke => self.directory.revoke_role_kv(role, &paths, op.class).await,
                RoleAction::Grant => self.directory.grant_role_kv(role, &paths, op.class).await,
            };

            result.map_err(|source| ReconcileError::RemoteCall {
                role: role.to_string(),
                action: op.action,
                path: op.path.clone(),
                class: op.class,
                source,
            })?;
            report.record(op);
        }

        Ok(report)
    }

    /// Create the role and grant its declared permissions.
    pub async fn create(&self, ctx: &OpContext, role: &Role) -> Result<ReconcileReport> {
        validate_role(role)?;

        self.checkpoint(ctx, "add_role")?;
        self.directory
            .add_role(&role.name)
            .await
            .map_err(|e| ReconcileError::call("role", &role.name, "add_role", e))?;

        let ops = op::plan(&PermissionSet::new(), &role.permissions);
        let report = self.apply(ctx, &role.name, &ops).await?;

        info!(role = %role.name, granted = report.granted, "Created role");
        Ok(report)
    }

    /// Move an existing role from `prior` to `desired`.
    ///
    /// Renaming is not an update: a name change is rejected with
    /// [`ReconcileError::RequiresReplacement`] before any call is made.
    pub async fn update(
        &self,
        ctx: &OpContext,
        prior: &Role,
        desired: &Role,
    ) -> Result<ReconcileReport> {
        if prior.name != desired.name {
            return Err(ReconcileError::RequiresReplacement {
                kind: "role",
                from: prior.name.clone(),
                to: desired.name.clone(),
            });
        }
        validate_role(desired)?;

        let ops = op::plan(&prior.permissions, &desired.permissions);
        let report = self.apply(ctx, &desired.name, &ops).await?;

        info!(
            role = %desired.name,
            revoked = report.revoked,
            granted = report.granted,
            "Updated role"
        );
        Ok(report)
    }

    /// Read a role back in declared form. `None` when the store has no such role.
    pub async fn observe(&self, ctx: &OpContext, name: &str) -> Result<Option<Role>> {
        self.checkpoint(ctx, "get_role")?;
        let record = self
            .directory
            .get_role(name)
            .await
            .map_err(|e| ReconcileError::call("role", name, "get_role", e))?;

        let Some(record) = record else {
            debug!(role = name, "Role not present in store");
            return Ok(None);
        };

        let permissions = PermissionSetCodec::decode(&record.permissions);
        debug!(role = name, paths = permissions.len(), "Observed role");
        Ok(Some(Role::new(record.name, permissions)))
    }

    /// Remove the role. Its grants go with it.
    pub async fn delete(&self, ctx: &OpContext, name: &str) -> Result<()> {
        self.checkpoint(ctx, "remove_role")?;
        self.directory
            .remove_role(name)
            .await
            .map_err(|e| ReconcileError::call("role", name, "remove_role", e))?;

        info!(role = name, "Deleted role");
        Ok(())
    }

    fn checkpoint(&self, ctx: &OpContext, step: &'static str) -> Result<()> {
        ctx.checkpoint()
            .map_err(|reason| ReconcileError::interrupted(reason, step))
    }
}
