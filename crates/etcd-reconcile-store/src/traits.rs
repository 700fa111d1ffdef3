//! Capability traits: the remote operations reconcilers depend on.
//!
//! Reconcilers never talk to the network themselves. They are handed an
//! implementation of these traits (HTTP in production, memory in tests) and
//! issue one call per step.

use async_trait::async_trait;
use etcd_reconcile_core::{KeyValue, PermissionClass, RoleRecord, UserRecord};

use crate::error::Result;

/// Role management in the store's auth subsystem.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Create an empty role.
    async fn add_role(&self, name: &str) -> Result<()>;

    /// Delete a role and, implicitly, all of its grants.
    async fn remove_role(&self, name: &str) -> Result<()>;

    /// Fetch a role. `None` when the store has no role by that name.
    async fn get_role(&self, name: &str) -> Result<Option<RoleRecord>>;

    /// Grant `class` access on `paths` to the role.
    async fn grant_role_kv(&self, name: &str, paths: &[String], class: PermissionClass)
        -> Result<()>;

    /// Revoke `class` access on `paths` from the role.
    async fn revoke_role_kv(
        &self,
        name: &str,
        paths: &[String],
        class: PermissionClass,
    ) -> Result<()>;
}

/// User management in the store's auth subsystem.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn add_user(&self, username: &str, password: &str) -> Result<()>;

    async fn remove_user(&self, username: &str) -> Result<()>;

    /// Fetch a user. `None` when the store has no user by that name.
    /// The password is never part of the answer.
    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn change_password(&self, username: &str, password: &str) -> Result<()>;

    /// Add role memberships to a user.
    async fn grant_user(&self, username: &str, roles: &[String]) -> Result<()>;

    /// Remove role memberships from a user.
    async fn revoke_user(&self, username: &str, roles: &[String]) -> Result<()>;
}

/// Raw key/value access.
#[async_trait]
pub trait KeyValueDirectory: Send + Sync {
    /// Create a key that must not exist yet.
    async fn create_key(&self, key: &str, value: &str) -> Result<KeyValue>;

    /// Create or overwrite a key.
    async fn set_key(&self, key: &str, value: &str) -> Result<KeyValue>;

    /// Fetch a key. `None` when it does not exist.
    async fn get_key(&self, key: &str) -> Result<Option<KeyValue>>;

    /// Delete a key. Returns `false` when there was nothing to delete.
    async fn delete_key(&self, key: &str) -> Result<bool>;
}

/// Everything a full session needs from one backend.
pub trait Directory: RoleDirectory + UserDirectory + KeyValueDirectory {}

impl<T: RoleDirectory + UserDirectory + KeyValueDirectory + ?Sized> Directory for T {}
