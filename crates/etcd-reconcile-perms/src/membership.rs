//! User lifecycle and role membership reconciliation.
//!
//! Membership follows the same revoke-then-grant policy as role permissions,
//! but batched: one `revoke_user` with every prior role, then one
//! `grant_user` with every desired role. Blank role names in a declaration
//! are never sent to the store.

use tracing::{debug, info};

use etcd_reconcile_core::{validate_user, OpContext, User};
use etcd_reconcile_store::UserDirectory;

use crate::error::{ReconcileError, Result};

/// Reconciles users against one directory.
pub struct MembershipReconciler<'a, D: UserDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: UserDirectory + ?Sized> MembershipReconciler<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Create the user, then grant its declared roles in one call.
    pub async fn create(&self, ctx: &OpContext, user: &User) -> Result<()> {
        validate_user(user)?;

        self.checkpoint(ctx, "add_user")?;
        self.directory
            .add_user(&user.username, &user.password)
            .await
            .map_err(|e| ReconcileError::call("user", &user.username, "add_user", e))?;

        let roles = declared_roles(&user.roles);
        if !roles.is_empty() {
            self.checkpoint(ctx, "grant_user")?;
            self.directory
                .grant_user(&user.username, &roles)
                .await
                .map_err(|e| ReconcileError::call("user", &user.username, "grant_user", e))?;
        }

        info!(user = %user.username, roles = roles.len(), "Created user");
        Ok(())
    }

    /// Read the user back. The store never returns passwords, so the one in
    /// `prior` is carried over.
    pub async fn observe(&self, ctx: &OpContext, prior: &User) -> Result<Option<User>> {
        self.checkpoint(ctx, "get_user")?;
        let record = self
            .directory
            .get_user(&prior.username)
            .await
            .map_err(|e| ReconcileError::call("user", &prior.username, "get_user", e))?;

        let Some(record) = record else {
            debug!(user = %prior.username, "User not present in store");
            return Ok(None);
        };

        Ok(Some(User {
            username: record.username,
            password: prior.password.clone(),
            roles: record.roles,
        }))
    }

    /// Move a user from `prior` to `desired`.
    ///
    /// The password is changed only when it differs. All prior roles are then
    /// revoked and all desired roles granted.
    pub async fn update(&self, ctx: &OpContext, prior: &User, desired: &User) -> Result<()> {
        if prior.username != desired.username {
            return Err(ReconcileError::RequiresReplacement {
                kind: "user",
                from: prior.username.clone(),
                to: desired.username.clone(),
            });
        }
        validate_user(desired)?;
        let username = desired.username.as_str();

        if prior.password != desired.password {
            self.checkpoint(ctx, "change_password")?;
            self.directory
                .change_password(username, &desired.password)
                .await
                .map_err(|e| ReconcileError::call("user", username, "change_password", e))?;
            debug!(user = username, "Changed password");
        }

        let revoked = declared_roles(&prior.roles);
        if !revoked.is_empty() {
            self.checkpoint(ctx, "revoke_user")?;
            self.directory
                .revoke_user(username, &revoked)
                .await
                .map_err(|e| ReconcileError::call("user", username, "revoke_user", e))?;
        }

        let granted = declared_roles(&desired.roles);
        if !granted.is_empty() {
            self.checkpoint(ctx, "grant_user")?;
            self.directory
                .grant_user(username, &granted)
                .await
                .map_err(|e| ReconcileError::call("user", username, "grant_user", e))?;
        }

        info!(
            user = username,
            revoked = revoked.len(),
            granted = granted.len(),
            "Updated user"
        );
        Ok(())
    }

    pub async fn delete(&self, ctx: &OpContext, username: &str) -> Result<()> {
        self.checkpoint(ctx, "remove_user")?;
        self.directory
            .remove_user(username)
            .await
            .map_err(|e| ReconcileError::call("user", username, "remove_user", e))?;

        info!(user = username, "Deleted user");
        Ok(())
    }

    fn checkpoint(&self, ctx: &OpContext, step: &'static str) -> Result<()> {
        ctx.checkpoint()
            .map_err(|reason| ReconcileError::interrupted(reason, step))
    }
}

/// Role names worth sending: blanks dropped, order kept.
fn declared_roles(roles: &[String]) -> Vec<String> {
    roles.iter().filter(|r| !r.is_empty()).cloned().collect()
}
