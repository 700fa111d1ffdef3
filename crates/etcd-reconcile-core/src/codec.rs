//! Conversion between declared permission sets and the store's dual lists.
//!
//! The store records a role's key permissions as two path lists, one for
//! read and one for write. Declared state is a set of per-path flag pairs.
//! [`PermissionSetCodec`] maps between the two without I/O.
//!
//! ```text
//!   { /a: r  , /b: rw , /c: w  }   <-- decode --   read:  [/a, /b]
//!                                  --- encode -->  write: [/b, /c]
//! ```

use tracing::debug;

use crate::types::{PermissionSet, StoreRolePermissions};

/// Stateless encoder/decoder for role permissions.
pub struct PermissionSetCodec;

impl PermissionSetCodec {
    /// Encode a declared set into read/write path lists.
    ///
    /// Entries with neither flag set are dropped. Paths appear in the set's
    /// insertion order; a read-write entry lands in both lists.
    pub fn encode(set: &PermissionSet) -> StoreRolePermissions {
        let mut out = StoreRolePermissions::default();
        for (entry, class) in set.classified() {
            if class.grants_read() {
                out.read_paths.push(entry.path.clone());
            }
            if class.grants_write() {
                out.write_paths.push(entry.path.clone());
            }
        }
        out
    }

    /// Decode read/write path lists into a declared set.
    ///
    /// Each distinct path yields exactly one entry. A path present in both
    /// lists becomes a single read-write entry. Order is the read list
    /// followed by write-only paths in write list order.
    ///
    /// Empty path strings cannot be held in a [`PermissionSet`] and are
    /// skipped. A grant on the empty path is therefore never part of the
    /// prior set, so later reconciliations never revoke it: it stays in the
    /// store unmanaged until removed by hand.
    pub fn decode(perms: &StoreRolePermissions) -> PermissionSet {
        let mut set = PermissionSet::new();
        for path in &perms.read_paths {
            if path.is_empty() {
                debug!(list = "read", "Skipping empty path; its grant stays unmanaged");
                continue;
            }
            set.merge_flags(path, true, false);
        }
        for path in &perms.write_paths {
            if path.is_empty() {
                debug!(list = "write", "Skipping empty path; its grant stays unmanaged");
                continue;
            }
            set.merge_flags(path, false, true);
        }
        set
    }
}
