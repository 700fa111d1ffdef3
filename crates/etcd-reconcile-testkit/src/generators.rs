//! Proptest generators for property-based testing.

use proptest::prelude::*;

use etcd_reconcile_core::{PermissionEntry, PermissionSet, StoreRolePermissions};

/// Generate a key path such as `/app/config`.
pub fn key_path() -> impl Strategy<Value = String> {
    "(/[a-z0-9]{1,4}){1,3}".prop_map(String::from)
}

/// Generate a role or user name.
pub fn entity_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate a single entry, including inert `(false, false)` ones.
pub fn permission_entry() -> impl Strategy<Value = PermissionEntry> {
    (key_path(), any::<bool>(), any::<bool>())
        .prop_map(|(path, r, w)| PermissionEntry::new(path, r, w))
}

/// Generate a valid set of up to `max_len` entries with distinct paths.
pub fn permission_set(max_len: usize) -> impl Strategy<Value = PermissionSet> {
    prop::collection::btree_map(key_path(), (any::<bool>(), any::<bool>()), 0..=max_len)
        .prop_map(|paths| {
            let entries = paths
                .into_iter()
                .map(|(path, (r, w))| PermissionEntry::new(path, r, w));
            PermissionSet::from_entries(entries)
                .expect("generated paths are distinct and non-empty")
        })
}

/// Generate raw store lists, possibly overlapping and with repeats.
pub fn store_permissions(max_len: usize) -> impl Strategy<Value = StoreRolePermissions> {
    (
        prop::collection::vec(key_path(), 0..=max_len),
        prop::collection::vec(key_path(), 0..=max_len),
    )
        .prop_map(|(read_paths, write_paths)| StoreRolePermissions {
            read_paths,
            write_paths,
        })
}

/// The classified part of `set`: what the store can actually hold.
pub fn effective(set: &PermissionSet) -> PermissionSet {
    PermissionSet::from_entries(set.classified().map(|(entry, _)| entry.clone()))
        .expect("subset of a valid set is valid")
}

/// Parameters for a role update.
#[derive(Debug, Clone)]
pub struct RoleUpdateParams {
    pub name: String,
    pub prior: PermissionSet,
    pub desired: PermissionSet,
}

impl Arbitrary for RoleUpdateParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (entity_name(), permission_set(8), permission_set(8))
            .prop_map(|(name, prior, desired)| RoleUpdateParams {
                name,
                prior,
                desired,
            })
            .boxed()
    }
}
