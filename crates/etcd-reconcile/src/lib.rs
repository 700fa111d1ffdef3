//! # etcd-reconcile
//!
//! Declarative management of etcd v2 keys, users and roles.
//!
//! ## Overview
//!
//! Callers declare the state they want and hand it, together with the state
//! they recorded last time, to a [`Session`]. The session issues the remote
//! calls that get the store there and returns what the store now reports.
//!
//! - **Roles**: per-path read/write permissions, reconciled revoke-then-grant
//! - **Users**: password and role memberships
//! - **Keys**: plain values with the store's modification index
//!
//! ## Key Concepts
//!
//! - **Prior state** is supplied by the caller; sessions keep none
//! - **Absent** entities read back as `None` and should be dropped from state
//! - **Passwords** are write-only; read-back keeps the declared one
//! - **No rollback**: a failed call leaves earlier calls applied
//!
//! ## Usage
//!
//! ```rust,no_run
//! use etcd_reconcile::{
//!     HttpDirectory, OpContext, PermissionEntry, PermissionSet, Role, Session, StoreConfig,
//! };
//! use std::time::Duration;
//!
//! async fn example() {
//!     let config = StoreConfig::from_env()
//!         .unwrap()
//!         .with_endpoint("http://127.0.0.1:2379");
//!     let session = Session::<HttpDirectory>::connect(&config).await.unwrap();
//!     let ctx = OpContext::with_timeout(Duration::from_secs(10));
//!
//!     let permissions = PermissionSet::from_entries([
//!         PermissionEntry::read_only("/app/config"),
//!         PermissionEntry::read_write("/metrics"),
//!     ])
//!     .unwrap();
//!     let role = session
//!         .create_role(&ctx, &Role::new("app", permissions))
//!         .await
//!         .unwrap();
//!     println!("{:?}", role);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `etcd_reconcile::core` - Data model and permission codec
//! - `etcd_reconcile::store` - Directory traits, HTTP and memory backends
//! - `etcd_reconcile::perms` - Role and membership reconcilers

pub mod error;
pub mod session;

// Re-export component crates
pub use etcd_reconcile_core as core;
pub use etcd_reconcile_perms as perms;
pub use etcd_reconcile_store as store;

// Re-export main types for convenience
pub use error::{Result, SessionError};
pub use session::Session;

// Re-export commonly used types
pub use etcd_reconcile_core::{
    KeyValue, OpContext, PermissionClass, PermissionEntry, PermissionSet, PermissionSetCodec,
    Role, StoreRolePermissions, User,
};
pub use etcd_reconcile_perms::{ReconcileError, ReconcileReport, RoleOp};
pub use etcd_reconcile_store::{Directory, HttpDirectory, MemoryDirectory, StoreConfig};
