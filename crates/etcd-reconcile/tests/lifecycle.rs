//! End-to-end resource lifecycles through a session.
//!
//! Each test walks a resource the way a declarative host would: create,
//! record the returned state, read, update from the recorded state, delete.

use etcd_reconcile::store::DirectoryCall;
use etcd_reconcile::{
    KeyValue, MemoryDirectory, OpContext, PermissionEntry, PermissionSet, Role, Session, User,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn permissions(entries: Vec<PermissionEntry>) -> PermissionSet {
    PermissionSet::from_entries(entries).unwrap()
}

#[tokio::test]
async fn test_role_lifecycle() {
    init_tracing();
    let session = Session::new(MemoryDirectory::new());
    let ctx = OpContext::new();

    let recorded = session
        .create_role(
            &ctx,
            &Role::new("app", permissions(vec![PermissionEntry::read_only("/a")])),
        )
        .await
        .unwrap();

    let desired = Role::new(
        "app",
        permissions(vec![
            PermissionEntry::read_write("/a"),
            PermissionEntry::write_only("/b"),
        ]),
    );
    let recorded = session.update_role(&ctx, &recorded, &desired).await.unwrap();
    assert_eq!(recorded, desired);

    // Re-applying the same state revokes and re-grants without conflict.
    let recorded = session.update_role(&ctx, &recorded, &desired).await.unwrap();
    assert_eq!(recorded, desired);

    session.delete_role(&ctx, "app").await.unwrap();
    assert!(session.read_role(&ctx, "app").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_lifecycle() {
    init_tracing();
    let session = Session::new(MemoryDirectory::new());
    let ctx = OpContext::new();

    for name in ["reader", "writer"] {
        session
            .create_role(&ctx, &Role::new(name, PermissionSet::new()))
            .await
            .unwrap();
    }

    let recorded = session
        .create_user(&ctx, &User::new("alice", "pw").with_roles(["reader"]))
        .await
        .unwrap();
    assert_eq!(recorded.roles, vec!["reader"]);

    let desired = User::new("alice", "pw2").with_roles(["reader", "writer"]);
    let recorded = session.update_user(&ctx, &recorded, &desired).await.unwrap();
    assert_eq!(recorded, desired);

    session.delete_user(&ctx, "alice").await.unwrap();
    assert!(session.read_user(&ctx, &recorded).await.unwrap().is_none());
}

#[tokio::test]
async fn test_key_drift_is_detected() {
    init_tracing();
    let session = Session::new(MemoryDirectory::new());
    let ctx = OpContext::new();

    let recorded = session
        .create_key(&ctx, &KeyValue::new("/cfg", "v1"))
        .await
        .unwrap();

    // Someone else writes the key.
    session.directory().insert_key("/cfg", "changed");

    let current = session.read_key(&ctx, &recorded).await.unwrap().unwrap();
    assert_eq!(current.value, "changed");
    assert!(current.modified_index > recorded.modified_index);

    let restored = session.update_key(&ctx, &recorded).await.unwrap();
    assert_eq!(restored.value, "v1");
}

#[tokio::test]
async fn test_session_clones_share_directory() {
    let session = Session::new(MemoryDirectory::new());
    let other = session.clone();

    other
        .create_key(&OpContext::new(), &KeyValue::new("/shared", "x"))
        .await
        .unwrap();

    assert_eq!(
        session.directory().calls(),
        vec![DirectoryCall::CreateKey { key: "/shared".into() }]
    );
}
