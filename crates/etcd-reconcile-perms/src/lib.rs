//! # etcd-reconcile perms
//!
//! Reconciliation of roles and user memberships against an etcd v2 auth
//! directory.
//!
//! ## Overview
//!
//! A role's declared permissions are a [`PermissionSet`] of per-path read and
//! write flags. The store keeps two path lists and only supports granting or
//! revoking a class of access on a path. [`RoleReconciler`] plans the calls
//! between a prior and a desired set and issues them one at a time.
//!
//! ## Key Concepts
//!
//! - **Plan**: ordered [`RoleOp`]s, every revoke before every grant
//! - **Apply**: one remote call per op, stop at the first failure
//! - **Observe**: read the store's lists back through the codec
//! - **Membership**: batched revoke then grant of user roles
//!
//! ## Usage
//!
//! ```rust,no_run
//! use etcd_reconcile_core::{OpContext, PermissionEntry, PermissionSet, Role};
//! use etcd_reconcile_perms::RoleReconciler;
//! use etcd_reconcile_store::MemoryDirectory;
//!
//! async fn example() {
//!     let directory = MemoryDirectory::new();
//!     let reconciler = RoleReconciler::new(&directory);
//!
//!     let permissions =
//!         PermissionSet::from_entries([PermissionEntry::read_only("/app/config")]).unwrap();
//!     let role = Role::new("app", permissions);
//!     reconciler.create(&OpContext::new(), &role).await.unwrap();
//! }
//! ```
//!
//! [`PermissionSet`]: etcd_reconcile_core::PermissionSet

pub mod error;
pub mod membership;
pub mod op;
pub mod role;

pub use error::{ReconcileError, Result};
pub use membership::MembershipReconciler;
pub use op::{plan, ReconcileReport, RoleAction, RoleOp};
pub use role::RoleReconciler;
