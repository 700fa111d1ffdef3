//! The Session: resource handlers for one etcd v2 endpoint.
//!
//! Each handler takes plain declared values, talks to the directory, and
//! returns the state the caller should record. Nothing is cached between
//! calls; prior state always comes from the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use etcd_reconcile_core::{validate_key, validate_key_value, KeyValue, OpContext, Role, User};
use etcd_reconcile_perms::{MembershipReconciler, RoleReconciler};
use etcd_reconcile_store::{Directory, HttpDirectory, StoreConfig};

use crate::error::{Result, SessionError};

/// Resource handlers bound to one directory.
///
/// Cloning is cheap and clones share the directory.
pub struct Session<D: Directory> {
    directory: Arc<D>,
}

impl<D: Directory> Clone for Session<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl Session<HttpDirectory> {
    /// Resolve `config` and connect to a live endpoint.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let directory = HttpDirectory::connect(config).await?;
        Ok(Self::new(directory))
    }
}

impl<D: Directory> Session<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory: Arc::new(directory),
        }
    }

    /// Get the directory reference.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    fn roles(&self) -> RoleReconciler<'_, D> {
        RoleReconciler::new(self.directory.as_ref())
    }

    fn members(&self) -> MembershipReconciler<'_, D> {
        MembershipReconciler::new(self.directory.as_ref())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a role and return it as the store now reports it.
    pub async fn create_role(&self, ctx: &OpContext, role: &Role) -> Result<Role> {
        self.roles().create(ctx, role).await?;
        self.read_role(ctx, &role.name)
            .await?
            .ok_or_else(|| SessionError::RoleNotFound(role.name.clone()))
    }

    /// Current state of a role. `None` means it is gone and should be
    /// dropped from recorded state.
    pub async fn read_role(&self, ctx: &OpContext, name: &str) -> Result<Option<Role>> {
        Ok(self.roles().observe(ctx, name).await?)
    }

    pub async fn update_role(&self, ctx: &OpContext, prior: &Role, desired: &Role) -> Result<Role> {
        self.roles().update(ctx, prior, desired).await?;
        self.read_role(ctx, &desired.name)
            .await?
            .ok_or_else(|| SessionError::RoleNotFound(desired.name.clone()))
    }

    pub async fn delete_role(&self, ctx: &OpContext, name: &str) -> Result<()> {
        Ok(self.roles().delete(ctx, name).await?)
    }

    /// Adopt an existing role into management.
    pub async fn import_role(&self, ctx: &OpContext, name: &str) -> Result<Role> {
        let role = self
            .read_role(ctx, name)
            .await?
            .ok_or_else(|| SessionError::RoleNotFound(name.to_string()))?;

        info!(role = name, paths = role.permissions.len(), "Imported role");
        Ok(role)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a user and return it as the store now reports it, with the
    /// declared password.
    pub async fn create_user(&self, ctx: &OpContext, user: &User) -> Result<User> {
        self.members().create(ctx, user).await?;
        self.read_user(ctx, user)
            .await?
            .ok_or_else(|| SessionError::UserNotFound(user.username.clone()))
    }

    pub async fn read_user(&self, ctx: &OpContext, prior: &User) -> Result<Option<User>> {
        Ok(self.members().observe(ctx, prior).await?)
    }

    pub async fn update_user(&self, ctx: &OpContext, prior: &User, desired: &User) -> Result<User> {
        self.members().update(ctx, prior, desired).await?;
        self.read_user(ctx, desired)
            .await?
            .ok_or_else(|| SessionError::UserNotFound(desired.username.clone()))
    }

    pub async fn delete_user(&self, ctx: &OpContext, username: &str) -> Result<()> {
        Ok(self.members().delete(ctx, username).await?)
    }

    /// Adopt an existing user into management.
    ///
    /// The store never reveals passwords, so the imported user carries an
    /// empty one until the caller declares it.
    pub async fn import_user(&self, ctx: &OpContext, username: &str) -> Result<User> {
        let user = self
            .read_user(ctx, &User::new(username, ""))
            .await?
            .ok_or_else(|| SessionError::UserNotFound(username.to_string()))?;

        warn!(
            user = username,
            "Imported user has no password; declare one before the next update"
        );
        Ok(user)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a key that must not exist yet.
    pub async fn create_key(&self, ctx: &OpContext, kv: &KeyValue) -> Result<KeyValue> {
        validate_key_value(kv)?;
        ctx.checkpoint()?;

        let stored = self.directory.create_key(&kv.key, &kv.value).await?;
        info!(key = %stored.key, modified_index = stored.modified_index, "Created key");
        Ok(stored)
    }

    /// Current value of a key. `None` means it is gone.
    pub async fn read_key(&self, ctx: &OpContext, prior: &KeyValue) -> Result<Option<KeyValue>> {
        ctx.checkpoint()?;

        let current = self.directory.get_key(&prior.key).await?;
        if current.is_none() {
            debug!(key = %prior.key, "Key not present in store");
        }
        Ok(current)
    }

    /// Overwrite a key with the desired value.
    pub async fn update_key(&self, ctx: &OpContext, desired: &KeyValue) -> Result<KeyValue> {
        validate_key_value(desired)?;
        ctx.checkpoint()?;

        let stored = self.directory.set_key(&desired.key, &desired.value).await?;
        info!(key = %stored.key, modified_index = stored.modified_index, "Updated key");
        Ok(stored)
    }

    /// Delete a key. A key that is already gone counts as deleted.
    pub async fn delete_key(&self, ctx: &OpContext, key: &str) -> Result<()> {
        ctx.checkpoint()?;

        if self.directory.delete_key(key).await? {
            info!(key, "Deleted key");
        } else {
            debug!(key, "Key already absent");
        }
        Ok(())
    }

    /// Fetch a key that must exist.
    pub async fn lookup_key(&self, ctx: &OpContext, key: &str) -> Result<KeyValue> {
        validate_key(key)?;
        ctx.checkpoint()?;

        self.directory
            .get_key(key)
            .await?
            .ok_or_else(|| SessionError::KeyNotFound(key.to_string()))
    }

    /// Adopt an existing key into management.
    pub async fn import_key(&self, ctx: &OpContext, key: &str) -> Result<KeyValue> {
        let kv = self.lookup_key(ctx, key).await?;
        info!(key, modified_index = kv.modified_index, "Imported key");
        Ok(kv)
    }
}
