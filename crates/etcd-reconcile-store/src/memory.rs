//! In-memory implementation of the directory traits.
//!
//! This is primarily for testing. It follows the store's auth rules (granting
//! something already held is a conflict, revoking something not held is a
//! no-op) and keeps a journal of every call so tests can assert on the exact
//! sequence a reconciler issued. Calls can be made to fail on demand.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use etcd_reconcile_core::{KeyValue, PermissionClass, RoleRecord, StoreRolePermissions, UserRecord};

use crate::error::{Result, StoreError};
use crate::traits::{KeyValueDirectory, RoleDirectory, UserDirectory};

/// One call made against a [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    AddRole { name: String },
    RemoveRole { name: String },
    GetRole { name: String },
    GrantRoleKv { name: String, paths: Vec<String>, class: PermissionClass },
    RevokeRoleKv { name: String, paths: Vec<String>, class: PermissionClass },
    AddUser { username: String },
    RemoveUser { username: String },
    GetUser { username: String },
    ChangePassword { username: String },
    GrantUser { username: String, roles: Vec<String> },
    RevokeUser { username: String, roles: Vec<String> },
    CreateKey { key: String },
    SetKey { key: String },
    GetKey { key: String },
    DeleteKey { key: String },
}

impl DirectoryCall {
    /// Whether this call changes store state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::GetRole { .. } | Self::GetUser { .. } | Self::GetKey { .. }
        )
    }
}

impl fmt::Display for DirectoryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddRole { name } => write!(f, "add_role({name})"),
            Self::RemoveRole { name } => write!(f, "remove_role({name})"),
            Self::GetRole { name } => write!(f, "get_role({name})"),
            Self::GrantRoleKv { name, paths, class } => {
                write!(f, "grant_role_kv({name}, {paths:?}, {class})")
            }
            Self::RevokeRoleKv { name, paths, class } => {
                write!(f, "revoke_role_kv({name}, {paths:?}, {class})")
            }
            Self::AddUser { username } => write!(f, "add_user({username})"),
            Self::RemoveUser { username } => write!(f, "remove_user({username})"),
            Self::GetUser { username } => write!(f, "get_user({username})"),
            Self::ChangePassword { username } => write!(f, "change_password({username})"),
            Self::GrantUser { username, roles } => write!(f, "grant_user({username}, {roles:?})"),
            Self::RevokeUser { username, roles } => write!(f, "revoke_user({username}, {roles:?})"),
            Self::CreateKey { key } => write!(f, "create_key({key})"),
            Self::SetKey { key } => write!(f, "set_key({key})"),
            Self::GetKey { key } => write!(f, "get_key({key})"),
            Self::DeleteKey { key } => write!(f, "delete_key({key})"),
        }
    }
}

type CallMatcher = Box<dyn Fn(&DirectoryCall) -> bool + Send + Sync>;

/// Makes matching calls fail with [`StoreError::Unavailable`].
struct FailureRule {
    matches: CallMatcher,
    /// Fail only the n-th matching call (1-based); `None` fails all of them.
    nth: Option<usize>,
    seen: usize,
}

impl FailureRule {
    fn trips(&mut self, call: &DirectoryCall) -> bool {
        if !(self.matches)(call) {
            return false;
        }
        self.seen += 1;
        self.nth.map_or(true, |n| self.seen == n)
    }
}

#[derive(Debug, Default)]
struct StoredRole {
    read: Vec<String>,
    write: Vec<String>,
}

#[derive(Debug)]
struct StoredUser {
    password: String,
    roles: Vec<String>,
}

#[derive(Debug)]
struct StoredKey {
    value: String,
    modified_index: u64,
}

#[derive(Default)]
struct MemoryDirectoryInner {
    roles: HashMap<String, StoredRole>,
    users: HashMap<String, StoredUser>,
    keys: BTreeMap<String, StoredKey>,
    /// Last assigned modification index.
    index: u64,
    journal: Vec<DirectoryCall>,
    failures: Vec<FailureRule>,
}

impl MemoryDirectoryInner {
    /// Journal the call and apply failure rules.
    fn record(&mut self, call: DirectoryCall) -> Result<()> {
        let mut tripped = false;
        for rule in &mut self.failures {
            tripped |= rule.trips(&call);
        }
        let described = call.to_string();
        self.journal.push(call);
        if tripped {
            return Err(StoreError::Unavailable(described));
        }
        Ok(())
    }

    fn role_mut(&mut self, name: &str) -> Result<&mut StoredRole> {
        self.roles
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found("role", name))
    }

    fn user_mut(&mut self, username: &str) -> Result<&mut StoredUser> {
        self.users
            .get_mut(username)
            .ok_or_else(|| StoreError::not_found("user", username))
    }

    fn write_key(&mut self, key: &str, value: &str) -> KeyValue {
        self.index += 1;
        self.keys.insert(
            key.to_string(),
            StoredKey {
                value: value.to_string(),
                modified_index: self.index,
            },
        );
        KeyValue {
            key: key.to_string(),
            value: value.to_string(),
            modified_index: self.index,
        }
    }
}

/// In-memory directory.
///
/// All data is lost when the directory is dropped. Thread-safe via Mutex.
pub struct MemoryDirectory {
    inner: Mutex<MemoryDirectoryInner>,
}

impl MemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryDirectoryInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryDirectoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Seeding and inspection (not journaled)
    // ─────────────────────────────────────────────────────────────────────────

    /// Seed a role with existing grants.
    pub fn insert_role(&self, name: &str, permissions: StoreRolePermissions) {
        self.lock().roles.insert(
            name.to_string(),
            StoredRole {
                read: permissions.read_paths,
                write: permissions.write_paths,
            },
        );
    }

    /// Seed a user with existing role memberships.
    pub fn insert_user(&self, username: &str, password: &str, roles: &[&str]) {
        self.lock().users.insert(
            username.to_string(),
            StoredUser {
                password: password.to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
        );
    }

    /// Seed a key.
    pub fn insert_key(&self, key: &str, value: &str) -> KeyValue {
        self.lock().write_key(key, value)
    }

    /// Current store view of a role.
    pub fn role(&self, name: &str) -> Option<RoleRecord> {
        self.lock().roles.get(name).map(|r| RoleRecord {
            name: name.to_string(),
            permissions: StoreRolePermissions {
                read_paths: r.read.clone(),
                write_paths: r.write.clone(),
            },
        })
    }

    /// Current store view of a user.
    pub fn user(&self, username: &str) -> Option<UserRecord> {
        self.lock().users.get(username).map(|u| UserRecord {
            username: username.to_string(),
            roles: u.roles.clone(),
        })
    }

    /// The stored password, for asserting that changes reached the store.
    pub fn password(&self, username: &str) -> Option<String> {
        self.lock().users.get(username).map(|u| u.password.clone())
    }

    pub fn key(&self, key: &str) -> Option<KeyValue> {
        self.lock().keys.get(key).map(|k| KeyValue {
            key: key.to_string(),
            value: k.value.clone(),
            modified_index: k.modified_index,
        })
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.lock().journal.clone()
    }

    /// Calls that change store state, in order.
    pub fn mutations(&self) -> Vec<DirectoryCall> {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().journal.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failure injection
    // ─────────────────────────────────────────────────────────────────────────

    /// Fail every call matching `matches`.
    pub fn fail_when<F>(&self, matches: F)
    where
        F: Fn(&DirectoryCall) -> bool + Send + Sync + 'static,
    {
        self.lock().failures.push(FailureRule {
            matches: Box::new(matches),
            nth: None,
            seen: 0,
        });
    }

    /// Fail only the `nth` (1-based) call matching `matches`.
    pub fn fail_nth<F>(&self, nth: usize, matches: F)
    where
        F: Fn(&DirectoryCall) -> bool + Send + Sync + 'static,
    {
        self.lock().failures.push(FailureRule {
            matches: Box::new(matches),
            nth: Some(nth),
            seen: 0,
        });
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleDirectory for MemoryDirectory {
    async fn add_role(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::AddRole { name: name.to_string() })?;

        if inner.roles.contains_key(name) {
            return Err(StoreError::conflict("role", name, "role already exists"));
        }
        inner.roles.insert(name.to_string(), StoredRole::default());
        Ok(())
    }

    async fn remove_role(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::RemoveRole { name: name.to_string() })?;

        inner
            .roles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("role", name))
    }

    async fn get_role(&self, name: &str) -> Result<Option<RoleRecord>> {
        self.lock()
            .record(DirectoryCall::GetRole { name: name.to_string() })?;
        Ok(self.role(name))
    }

    async fn grant_role_kv(
        &self,
        name: &str,
        paths: &[String],
        class: PermissionClass,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::GrantRoleKv {
            name: name.to_string(),
            paths: paths.to_vec(),
            class,
        })?;

        let role = inner.role_mut(name)?;

        // Check everything first so a rejected grant leaves the role untouched.
        for path in paths {
            if class.grants_read() && role.read.contains(path) {
                return Err(StoreError::conflict(
                    "role",
                    name,
                    format!("granting duplicate read permission {path}"),
                ));
            }
            if class.grants_write() && role.write.contains(path) {
                return Err(StoreError::conflict(
                    "role",
                    name,
                    format!("granting duplicate write permission {path}"),
                ));
            }
        }

        for path in paths {
            if class.grants_read() {
                role.read.push(path.clone());
            }
            if class.grants_write() {
                role.write.push(path.clone());
            }
        }
        Ok(())
    }

    async fn revoke_role_kv(
        &self,
        name: &str,
        paths: &[String],
        class: PermissionClass,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::RevokeRoleKv {
            name: name.to_string(),
            paths: paths.to_vec(),
            class,
        })?;

        let role = inner.role_mut(name)?;
        for path in paths {
            if class.grants_read() {
                revoke_path(name, &mut role.read, path, "read");
            }
            if class.grants_write() {
                revoke_path(name, &mut role.write, path, "write");
            }
        }
        Ok(())
    }
}

fn revoke_path(role: &str, list: &mut Vec<String>, path: &str, bit: &str) {
    match list.iter().position(|p| p == path) {
        Some(idx) => {
            list.remove(idx);
        }
        None => debug!(role, path, bit, "Revoking ungranted permission, ignoring"),
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn add_user(&self, username: &str, password: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::AddUser {
            username: username.to_string(),
        })?;

        if inner.users.contains_key(username) {
            return Err(StoreError::conflict("user", username, "user already exists"));
        }
        inner.users.insert(
            username.to_string(),
            StoredUser {
                password: password.to_string(),
                roles: Vec::new(),
            },
        );
        Ok(())
    }

    async fn remove_user(&self, username: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::RemoveUser {
            username: username.to_string(),
        })?;

        inner
            .users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("user", username))
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        self.lock().record(DirectoryCall::GetUser {
            username: username.to_string(),
        })?;
        Ok(self.user(username))
    }

    async fn change_password(&self, username: &str, password: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::ChangePassword {
            username: username.to_string(),
        })?;

        inner.user_mut(username)?.password = password.to_string();
        Ok(())
    }

    async fn grant_user(&self, username: &str, roles: &[String]) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::GrantUser {
            username: username.to_string(),
            roles: roles.to_vec(),
        })?;

        if let Some(missing) = roles.iter().find(|r| !inner.roles.contains_key(*r)) {
            return Err(StoreError::not_found("role", missing.clone()));
        }

        let user = inner.user_mut(username)?;
        if let Some(held) = roles.iter().find(|r| user.roles.contains(*r)) {
            return Err(StoreError::conflict(
                "user",
                username,
                format!("granting duplicate role {held}"),
            ));
        }
        user.roles.extend(roles.iter().cloned());
        Ok(())
    }

    async fn revoke_user(&self, username: &str, roles: &[String]) -> Result<()> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::RevokeUser {
            username: username.to_string(),
            roles: roles.to_vec(),
        })?;

        let user = inner.user_mut(username)?;
        for role in roles {
            match user.roles.iter().position(|r| r == role) {
                Some(idx) => {
                    user.roles.remove(idx);
                }
                None => debug!(username, role = %role, "Revoking ungranted role, ignoring"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueDirectory for MemoryDirectory {
    async fn create_key(&self, key: &str, value: &str) -> Result<KeyValue> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::CreateKey { key: key.to_string() })?;

        if inner.keys.contains_key(key) {
            return Err(StoreError::conflict("key", key, "key already exists"));
        }
        Ok(inner.write_key(key, value))
    }

    async fn set_key(&self, key: &str, value: &str) -> Result<KeyValue> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::SetKey { key: key.to_string() })?;
        Ok(inner.write_key(key, value))
    }

    async fn get_key(&self, key: &str) -> Result<Option<KeyValue>> {
        self.lock()
            .record(DirectoryCall::GetKey { key: key.to_string() })?;
        Ok(self.key(key))
    }

    async fn delete_key(&self, key: &str) -> Result<bool> {
        let mut inner = self.lock();
        inner.record(DirectoryCall::DeleteKey { key: key.to_string() })?;
        Ok(inner.keys.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_grant_and_revoke_role_kv() {
        let dir = MemoryDirectory::new();
        dir.add_role("app").await.unwrap();

        dir.grant_role_kv("app", &paths(&["/a"]), PermissionClass::ReadWrite)
            .await
            .unwrap();
        dir.grant_role_kv("app", &paths(&["/b"]), PermissionClass::ReadOnly)
            .await
            .unwrap();

        let role = dir.get_role("app").await.unwrap().unwrap();
        assert_eq!(role.permissions.read_paths, paths(&["/a", "/b"]));
        assert_eq!(role.permissions.write_paths, paths(&["/a"]));

        dir.revoke_role_kv("app", &paths(&["/a"]), PermissionClass::ReadOnly)
            .await
            .unwrap();
        let role = dir.role("app").unwrap();
        assert_eq!(role.permissions.read_paths, paths(&["/b"]));
        assert_eq!(role.permissions.write_paths, paths(&["/a"]));
    }

    #[tokio::test]
    async fn test_duplicate_grant_conflicts() {
        let dir = MemoryDirectory::new();
        dir.add_role("app").await.unwrap();
        dir.grant_role_kv("app", &paths(&["/a"]), PermissionClass::ReadOnly)
            .await
            .unwrap();

        let err = dir
            .grant_role_kv("app", &paths(&["/a"]), PermissionClass::ReadWrite)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Rejected grant leaves write list untouched.
        assert!(dir.role("app").unwrap().permissions.write_paths.is_empty());
    }

    #[tokio::test]
    async fn test_revoke_ungranted_is_ignored() {
        let dir = MemoryDirectory::new();
        dir.add_role("app").await.unwrap();

        dir.revoke_role_kv("app", &paths(&["/nope"]), PermissionClass::WriteOnly)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_role() {
        let dir = MemoryDirectory::new();

        assert!(dir.get_role("ghost").await.unwrap().is_none());
        let err = dir
            .grant_role_kv("ghost", &paths(&["/a"]), PermissionClass::ReadOnly)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(dir.remove_role("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_user_membership() {
        let dir = MemoryDirectory::new();
        dir.add_role("reader").await.unwrap();
        dir.add_user("alice", "pw").await.unwrap();

        dir.grant_user("alice", &paths(&["reader"])).await.unwrap();
        assert_eq!(dir.user("alice").unwrap().roles, paths(&["reader"]));

        let err = dir.grant_user("alice", &paths(&["writer"])).await.unwrap_err();
        assert!(err.is_not_found());

        dir.revoke_user("alice", &paths(&["reader", "never-held"]))
            .await
            .unwrap();
        assert!(dir.user("alice").unwrap().roles.is_empty());
    }

    #[tokio::test]
    async fn test_change_password() {
        let dir = MemoryDirectory::new();
        dir.add_user("alice", "old").await.unwrap();
        dir.change_password("alice", "new").await.unwrap();

        assert_eq!(dir.password("alice").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_keys_bump_modified_index() {
        let dir = MemoryDirectory::new();

        let first = dir.create_key("/a", "1").await.unwrap();
        let second = dir.set_key("/a", "2").await.unwrap();
        assert!(second.modified_index > first.modified_index);

        let err = dir.create_key("/a", "3").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        assert!(dir.delete_key("/a").await.unwrap());
        assert!(!dir.delete_key("/a").await.unwrap());
        assert!(dir.get_key("/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_journal_records_calls_in_order() {
        let dir = MemoryDirectory::new();
        dir.add_role("app").await.unwrap();
        dir.get_role("app").await.unwrap();
        dir.remove_role("app").await.unwrap();

        assert_eq!(
            dir.calls(),
            vec![
                DirectoryCall::AddRole { name: "app".into() },
                DirectoryCall::GetRole { name: "app".into() },
                DirectoryCall::RemoveRole { name: "app".into() },
            ]
        );
        assert_eq!(dir.mutations().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_nth_matching_call() {
        let dir = MemoryDirectory::new();
        dir.add_role("app").await.unwrap();
        dir.fail_nth(2, |c| matches!(c, DirectoryCall::GrantRoleKv { .. }));

        assert!(dir
            .grant_role_kv("app", &paths(&["/a"]), PermissionClass::ReadOnly)
            .await
            .is_ok());
        let err = dir
            .grant_role_kv("app", &paths(&["/b"]), PermissionClass::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(dir
            .grant_role_kv("app", &paths(&["/c"]), PermissionClass::ReadOnly)
            .await
            .is_ok());

        // The failed call is journaled but did not change state.
        assert_eq!(dir.calls().len(), 4);
        assert_eq!(
            dir.role("app").unwrap().permissions.read_paths,
            paths(&["/a", "/c"])
        );
    }

    #[tokio::test]
    async fn test_fail_when_every_match() {
        let dir = MemoryDirectory::new();
        dir.fail_when(|c| matches!(c, DirectoryCall::GetKey { .. }));

        assert!(dir.get_key("/a").await.is_err());
        assert!(dir.get_key("/b").await.is_err());

        dir.clear_failures();
        assert!(dir.get_key("/a").await.is_ok());
    }
}
