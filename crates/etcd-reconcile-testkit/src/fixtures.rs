//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use etcd_reconcile::Session;
use etcd_reconcile_core::{
    OpContext, PermissionEntry, PermissionSet, PermissionSetCodec, Role, StoreRolePermissions,
};
use etcd_reconcile_store::MemoryDirectory;

/// A session over a fresh memory directory, plus a default context.
pub struct TestFixture {
    pub session: Session<MemoryDirectory>,
    pub ctx: OpContext,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            session: Session::new(MemoryDirectory::new()),
            ctx: OpContext::new(),
        }
    }

    pub fn directory(&self) -> &MemoryDirectory {
        self.session.directory()
    }

    /// Put a role straight into the store, as if an earlier run created it.
    ///
    /// Returns the role as the caller would have recorded it.
    pub fn seed_role(&self, name: &str, permissions: &PermissionSet) -> Role {
        self.directory()
            .insert_role(name, PermissionSetCodec::encode(permissions));
        Role::new(name, permissions.clone())
    }

    /// Put empty roles into the store so users can be granted them.
    pub fn seed_empty_roles(&self, names: &[&str]) {
        for name in names {
            self.directory()
                .insert_role(name, StoreRolePermissions::default());
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a set from `(path, read, write)` triples.
///
/// Panics on empty or repeated paths.
pub fn permission_set(entries: &[(&str, bool, bool)]) -> PermissionSet {
    PermissionSet::from_entries(
        entries
            .iter()
            .map(|&(path, r, w)| PermissionEntry::new(path, r, w)),
    )
    .expect("fixture permission sets are valid")
}
