//! # etcd-reconcile testkit
//!
//! Testing utilities for etcd-reconcile.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden scenarios**: Fixed reconciliations with the exact calls they must issue
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Scenarios
//!
//! ```rust,ignore
//! use etcd_reconcile_testkit::scenarios::{all_scenarios, verify_scenario};
//!
//! for scenario in all_scenarios() {
//!     verify_scenario(&scenario).await.unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use etcd_reconcile_core::PermissionSetCodec;
//! use etcd_reconcile_testkit::generators::{effective, permission_set};
//!
//! proptest! {
//!     #[test]
//!     fn round_trip(set in permission_set(8)) {
//!         let decoded = PermissionSetCodec::decode(&PermissionSetCodec::encode(&set));
//!         prop_assert_eq!(decoded, effective(&set));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use etcd_reconcile_testkit::fixtures::{permission_set, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let role = fixture.seed_role("app", &permission_set(&[("/a", true, false)]));
//! assert!(fixture.directory().role("app").is_some());
//! # let _ = role;
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{permission_set, TestFixture};
pub use generators::{effective, RoleUpdateParams};
pub use scenarios::{all_scenarios, run_scenario, verify_scenario, GoldenScenario, ScenarioOutcome};
