//! Access-level classification of a read/write flag pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The access level a single grant or revoke carries to the store.
///
/// A flag pair with neither bit set has no class: it is never sent to the
/// store. See [`PermissionClass::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionClass {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl PermissionClass {
    /// Classify a `(can_read, can_write)` pair.
    ///
    /// Returns `None` for the inert pair `(false, false)`.
    pub const fn classify(can_read: bool, can_write: bool) -> Option<Self> {
        match (can_read, can_write) {
            (true, true) => Some(Self::ReadWrite),
            (true, false) => Some(Self::ReadOnly),
            (false, true) => Some(Self::WriteOnly),
            (false, false) => None,
        }
    }

    /// Whether this class touches the store's read list.
    pub const fn grants_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    /// Whether this class touches the store's write list.
    pub const fn grants_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read",
            Self::WriteOnly => "write",
            Self::ReadWrite => "readwrite",
        }
    }
}

impl fmt::Display for PermissionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_pairs() {
        assert_eq!(PermissionClass::classify(true, true), Some(PermissionClass::ReadWrite));
        assert_eq!(PermissionClass::classify(true, false), Some(PermissionClass::ReadOnly));
        assert_eq!(PermissionClass::classify(false, true), Some(PermissionClass::WriteOnly));
        assert_eq!(PermissionClass::classify(false, false), None);
    }

    #[test]
    fn test_list_membership() {
        assert!(PermissionClass::ReadWrite.grants_read());
        assert!(PermissionClass::ReadWrite.grants_write());
        assert!(PermissionClass::ReadOnly.grants_read());
        assert!(!PermissionClass::ReadOnly.grants_write());
        assert!(!PermissionClass::WriteOnly.grants_read());
        assert!(PermissionClass::WriteOnly.grants_write());
    }

    #[test]
    fn test_display() {
        assert_eq!(PermissionClass::ReadWrite.to_string(), "readwrite");
    }
}
