//! # etcd-reconcile core
//!
//! Pure model for declarative etcd v2 management: permission sets, roles,
//! users, keys, and the codec between declared per-path flags and the
//! store's read/write path lists.
//!
//! This crate contains no I/O. Remote calls live behind the capability traits
//! in `etcd-reconcile-store`.
//!
//! ## Key Types
//!
//! - [`PermissionEntry`] - One declared `{path, read, write}` triple
//! - [`PermissionSet`] - Path-keyed, insertion-ordered set of entries
//! - [`PermissionClass`] - `ReadOnly | WriteOnly | ReadWrite` classification
//! - [`StoreRolePermissions`] - The store's two path lists
//! - [`PermissionSetCodec`] - Encode/decode between the two shapes
//! - [`OpContext`] - Deadline and cancellation checked before remote calls

pub mod class;
pub mod codec;
pub mod context;
pub mod error;
pub mod types;
pub mod validation;

pub use class::PermissionClass;
pub use codec::PermissionSetCodec;
pub use context::OpContext;
pub use error::{Interrupted, ValidationError};
pub use types::{
    KeyValue, PermissionEntry, PermissionSet, Role, RoleRecord, StoreRolePermissions, User,
    UserRecord,
};
pub use validation::{
    validate_key, validate_key_value, validate_name, validate_role, validate_user,
};
