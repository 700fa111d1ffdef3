//! Golden reconciliation scenarios.
//!
//! Each scenario fixes a prior and a desired permission set and the exact
//! permission calls a reconciliation must issue between them. Scenarios run
//! against a [`MemoryDirectory`] and are checked against its call journal.

use etcd_reconcile_core::{
    OpContext, PermissionClass, PermissionSet, PermissionSetCodec, Role, StoreRolePermissions,
};
use etcd_reconcile_perms::{ReconcileError, RoleAction, RoleOp, RoleReconciler};
use etcd_reconcile_store::{DirectoryCall, MemoryDirectory};

use crate::fixtures::permission_set;

/// Name every scenario reconciles.
pub const SCENARIO_ROLE: &str = "scenario";

/// A golden scenario.
#[derive(Debug, Clone)]
pub struct GoldenScenario {
    /// Human-readable name for the scenario.
    pub name: &'static str,
    /// Run `create` instead of `update`; `prior` must then be empty.
    pub create: bool,
    pub prior: &'static [(&'static str, bool, bool)],
    pub desired: &'static [(&'static str, bool, bool)],
    /// Fail the n-th (1-based) grant call.
    pub fail_grant: Option<usize>,
    /// Permission calls expected in the journal, in order.
    pub expected_ops: Vec<RoleOp>,
    /// Path named by the failure, when one is injected.
    pub expected_failed_path: Option<&'static str>,
}

/// What running a scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub issued: Vec<RoleOp>,
    pub failed_path: Option<String>,
    pub stored: Option<StoreRolePermissions>,
}

/// Get all golden scenarios.
pub fn all_scenarios() -> Vec<GoldenScenario> {
    use PermissionClass::{ReadOnly, ReadWrite, WriteOnly};

    vec![
        GoldenScenario {
            name: "create grants every declared path",
            create: true,
            prior: &[],
            desired: &[("/app/config", true, false), ("/metrics", true, true)],
            fail_grant: None,
            expected_ops: vec![
                RoleOp::grant("/app/config", ReadOnly),
                RoleOp::grant("/metrics", ReadWrite),
            ],
            expected_failed_path: None,
        },
        GoldenScenario {
            name: "read upgraded to read-write",
            create: false,
            prior: &[("/a", true, false)],
            desired: &[("/a", true, true)],
            fail_grant: None,
            expected_ops: vec![RoleOp::revoke("/a", ReadOnly), RoleOp::grant("/a", ReadWrite)],
            expected_failed_path: None,
        },
        GoldenScenario {
            name: "read swapped for write",
            create: false,
            prior: &[("/x", true, false)],
            desired: &[("/x", false, true)],
            fail_grant: None,
            expected_ops: vec![RoleOp::revoke("/x", ReadOnly), RoleOp::grant("/x", WriteOnly)],
            expected_failed_path: None,
        },
        GoldenScenario {
            name: "unchanged set is revoked and regranted",
            create: false,
            prior: &[("/x", true, true)],
            desired: &[("/x", true, true)],
            fail_grant: None,
            expected_ops: vec![RoleOp::revoke("/x", ReadWrite), RoleOp::grant("/x", ReadWrite)],
            expected_failed_path: None,
        },
        GoldenScenario {
            name: "inert entries issue nothing",
            create: false,
            prior: &[("/old", false, false)],
            desired: &[("/n", false, false), ("/y", false, true)],
            fail_grant: None,
            expected_ops: vec![RoleOp::grant("/y", WriteOnly)],
            expected_failed_path: None,
        },
        GoldenScenario {
            name: "second of three grants fails",
            create: false,
            prior: &[],
            desired: &[("/one", true, false), ("/two", true, false), ("/three", true, false)],
            fail_grant: Some(2),
            expected_ops: vec![RoleOp::grant("/one", ReadOnly), RoleOp::grant("/two", ReadOnly)],
            expected_failed_path: Some("/two"),
        },
    ]
}

/// Permission calls in a journal, as ops. Other calls are skipped.
pub fn permission_ops(calls: &[DirectoryCall]) -> Vec<RoleOp> {
    calls
        .iter()
        .flat_map(|call| {
            let (action, paths, class) = match call {
                DirectoryCall::GrantRoleKv { paths, class, .. } => {
                    (RoleAction::Grant, paths, *class)
                }
                DirectoryCall::RevokeRoleKv { paths, class, .. } => {
                    (RoleAction::Revoke, paths, *class)
                }
                _ => return Vec::new(),
            };
            paths
                .iter()
                .map(|path| RoleOp {
                    action,
                    path: path.clone(),
                    class,
                })
                .collect()
        })
        .collect()
}

/// Run a scenario against a fresh memory directory.
pub async fn run_scenario(scenario: &GoldenScenario) -> ScenarioOutcome {
    let directory = MemoryDirectory::new();
    let prior: PermissionSet = permission_set(scenario.prior);
    let desired = Role::new(SCENARIO_ROLE, permission_set(scenario.desired));

    if !scenario.create {
        directory.insert_role(SCENARIO_ROLE, PermissionSetCodec::encode(&prior));
    }
    if let Some(n) = scenario.fail_grant {
        directory.fail_nth(n, |c| matches!(c, DirectoryCall::GrantRoleKv { .. }));
    }

    let reconciler = RoleReconciler::new(&directory);
    let ctx = OpContext::new();
    let result = if scenario.create {
        reconciler.create(&ctx, &desired).await
    } else {
        let prior = Role::new(SCENARIO_ROLE, prior);
        reconciler.update(&ctx, &prior, &desired).await
    };

    let failed_path = match result {
        Err(ReconcileError::RemoteCall { path, .. }) => Some(path),
        _ => None,
    };

    ScenarioOutcome {
        issued: permission_ops(&directory.calls()),
        failed_path,
        stored: directory.role(SCENARIO_ROLE).map(|r| r.permissions),
    }
}

/// Run a scenario and compare it with its expectations.
pub async fn verify_scenario(scenario: &GoldenScenario) -> Result<ScenarioOutcome, String> {
    let outcome = run_scenario(scenario).await;

    if outcome.issued != scenario.expected_ops {
        return Err(format!(
            "scenario '{}': expected {:?}, issued {:?}",
            scenario.name, scenario.expected_ops, outcome.issued
        ));
    }
    if outcome.failed_path.as_deref() != scenario.expected_failed_path {
        return Err(format!(
            "scenario '{}': expected failure at {:?}, got {:?}",
            scenario.name, scenario.expected_failed_path, outcome.failed_path
        ));
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_are_unique() {
        let scenarios = all_scenarios();
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn test_create_scenarios_have_no_prior() {
        for scenario in all_scenarios().iter().filter(|s| s.create) {
            assert!(scenario.prior.is_empty(), "{}", scenario.name);
        }
    }

    #[test]
    fn test_permission_ops_skips_lifecycle_calls() {
        let calls = vec![
            DirectoryCall::AddRole { name: "r".into() },
            DirectoryCall::GrantRoleKv {
                name: "r".into(),
                paths: vec!["/a".into()],
                class: PermissionClass::ReadOnly,
            },
        ];
        assert_eq!(
            permission_ops(&calls),
            vec![RoleOp::grant("/a", PermissionClass::ReadOnly)]
        );
    }
}
