//! # etcd-reconcile store
//!
//! Capability traits for the remote side of reconciliation, with an etcd v2
//! HTTP implementation and an in-memory implementation.
//!
//! ## Overview
//!
//! Reconcilers are written against [`RoleDirectory`], [`UserDirectory`] and
//! [`KeyValueDirectory`] and never construct a client themselves. The
//! primary implementation is [`HttpDirectory`], with [`MemoryDirectory`] for
//! testing.
//!
//! ## Key Types
//!
//! - [`Directory`] - All three capabilities from one backend
//! - [`HttpDirectory`] - etcd v2 REST client
//! - [`MemoryDirectory`] - In-memory store with a call journal and failure injection
//! - [`StoreConfig`] - Endpoint, credentials and timeout, layered from env
//!
//! ## Usage
//!
//! ```rust,no_run
//! use etcd_reconcile_store::{HttpDirectory, RoleDirectory, StoreConfig};
//!
//! async fn example() {
//!     let config = StoreConfig::from_env()
//!         .unwrap()
//!         .with_endpoint("http://127.0.0.1:2379");
//!     let directory = HttpDirectory::connect(&config).await.unwrap();
//!
//!     let role = directory.get_role("app").await.unwrap();
//!     println!("{:?}", role);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absent is not an error**: `get_*` return `Ok(None)` for missing entities
//! - **Duplicate grants conflict**: granting something already held fails
//! - **Ungranted revokes are ignored**: revoking something not held succeeds

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use config::{ConfigError, ConnectionSettings, Credentials, StoreConfig};
pub use error::{Result, StoreError};
pub use http::HttpDirectory;
pub use memory::{DirectoryCall, MemoryDirectory};
pub use traits::{Directory, KeyValueDirectory, RoleDirectory, UserDirectory};
