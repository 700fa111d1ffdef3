//! Declared and observed entities: permission sets, roles, users, keys.
//!
//! Declared values (`Role`, `User`, `KeyValue`) are what callers hand in and
//! what handlers return as the new observed state. Store views
//! (`RoleRecord`, `UserRecord`) are what a directory reports back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::class::PermissionClass;
use crate::error::ValidationError;

/// One declared permission on a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionEntry {
    #[serde(rename = "key_path")]
    pub path: String,

    #[serde(rename = "read")]
    pub can_read: bool,

    #[serde(rename = "write")]
    pub can_write: bool,
}

impl PermissionEntry {
    pub fn new(path: impl Into<String>, can_read: bool, can_write: bool) -> Self {
        Self {
            path: path.into(),
            can_read,
            can_write,
        }
    }

    pub fn read_only(path: impl Into<String>) -> Self {
        Self::new(path, true, false)
    }

    pub fn write_only(path: impl Into<String>) -> Self {
        Self::new(path, false, true)
    }

    pub fn read_write(path: impl Into<String>) -> Self {
        Self::new(path, true, true)
    }

    /// The class this entry grants, or `None` if both flags are off.
    pub fn class(&self) -> Option<PermissionClass> {
        PermissionClass::classify(self.can_read, self.can_write)
    }
}

/// A path-keyed set of permission entries.
///
/// Iteration follows insertion order so that encoding and reconciliation
/// plans are reproducible. Equality ignores order: two sets are equal when
/// they hold the same paths with the same flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<PermissionEntry>", into = "Vec<PermissionEntry>")]
pub struct PermissionSet {
    entries: Vec<PermissionEntry>,
    /// path -> position in `entries`.
    by_path: HashMap<String, usize>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from declared entries, rejecting empty and repeated paths.
    pub fn from_entries<I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = PermissionEntry>,
    {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry)?;
        }
        Ok(set)
    }

    /// Add a declared entry. The path must be non-empty and not yet present.
    pub fn insert(&mut self, entry: PermissionEntry) -> Result<(), ValidationError> {
        if entry.path.is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        if self.by_path.contains_key(&entry.path) {
            return Err(ValidationError::DuplicatePath(entry.path));
        }
        self.by_path.insert(entry.path.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Turn on flags for `path`, adding the entry if it is new.
    ///
    /// Unlike [`insert`](Self::insert) this merges: a path seen twice ends up
    /// as one entry carrying the union of both flag pairs.
    pub(crate) fn merge_flags(&mut self, path: &str, can_read: bool, can_write: bool) {
        match self.by_path.get(path) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                entry.can_read |= can_read;
                entry.can_write |= can_write;
            }
            None => {
                self.by_path.insert(path.to_owned(), self.entries.len());
                self.entries.push(PermissionEntry::new(path, can_read, can_write));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&PermissionEntry> {
        self.by_path.get(path).map(|&idx| &self.entries[idx])
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PermissionEntry> {
        self.entries.iter()
    }

    /// Entries that actually carry access, paired with their class.
    pub fn classified(&self) -> impl Iterator<Item = (&PermissionEntry, PermissionClass)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.class().map(|class| (entry, class)))
    }

    pub fn into_entries(self) -> Vec<PermissionEntry> {
        self.entries
    }
}

impl PartialEq for PermissionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|entry| other.get(&entry.path) == Some(entry))
    }
}

impl Eq for PermissionSet {}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a PermissionEntry;
    type IntoIter = std::slice::Iter<'a, PermissionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl TryFrom<Vec<PermissionEntry>> for PermissionSet {
    type Error = ValidationError;

    fn try_from(entries: Vec<PermissionEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<PermissionSet> for Vec<PermissionEntry> {
    fn from(set: PermissionSet) -> Self {
        set.entries
    }
}

/// Store-native role permissions: one list of read-granted paths and one of
/// write-granted paths. A path in both lists has read-write access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRolePermissions {
    pub read_paths: Vec<String>,
    pub write_paths: Vec<String>,
}

impl StoreRolePermissions {
    pub fn is_empty(&self) -> bool {
        self.read_paths.is_empty() && self.write_paths.is_empty()
    }
}

/// A declared role. The name is its identity and cannot change in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,

    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }
}

/// A role as the store reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRecord {
    pub name: String,
    pub permissions: StoreRolePermissions,
}

/// A declared user.
///
/// The password is write-only: the store never returns it, so observed
/// copies carry whatever value was already held locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

/// A user as the store reports it (no password).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub roles: Vec<String>,
}

/// A key/value node. `modified_index` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,

    #[serde(default)]
    pub modified_index: u64,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            modified_index: 0,
        }
    }
}
