//! Snapshot import/export tests

use assert_matches::assert_matches;
use rbac_core::{AssignmentStore, HierarchyStore, ItemKind, ItemName, PrincipalId, StoreError};
use rbac_store::{MemoryItemStore, StoreSnapshot};

const SNAPSHOT: &str = r#"
[[items]]
name = "checkrole"
kind = "role"
description = "Role under test"

[[items]]
name = "checktask"
kind = "task"

[[items]]
name = "checkop"
kind = "operation"
rule = "business-hours"

[[edges]]
parent = "checkrole"
child = "checktask"

[[edges]]
parent = "checktask"
child = "checkop"

[[assignments]]
item = "checkrole"
principal = "u"
"#;

#[tokio::test]
async fn test_store_loads_from_toml_snapshot() {
    let snapshot: StoreSnapshot = toml::from_str(SNAPSHOT).unwrap();
    let store = MemoryItemStore::from_snapshot(snapshot).await.unwrap();

    let children = store.children(&ItemName::from("checkrole")).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind, ItemKind::Task);

    let op = store.load_item(&ItemName::from("checkop")).await.unwrap();
    assert_eq!(op.rule.as_ref().map(|r| r.as_str()), Some("business-hours"));

    let assigned = store
        .assigned_items(&PrincipalId::from("u"), Some(ItemKind::Role))
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
}

#[tokio::test]
async fn test_snapshot_survives_export_and_reload() {
    let snapshot: StoreSnapshot = toml::from_str(SNAPSHOT).unwrap();
    let store = MemoryItemStore::from_snapshot(snapshot).await.unwrap();

    let exported = store.snapshot().await;
    let text = toml::to_string(&exported).unwrap();
    let reloaded: StoreSnapshot = toml::from_str(&text).unwrap();

    assert_eq!(reloaded, exported);
    assert_eq!(reloaded.items.len(), 3);
    assert_eq!(reloaded.edges.len(), 2);
    assert_eq!(reloaded.assignments.len(), 1);
}

#[tokio::test]
async fn test_snapshot_with_dangling_edge_is_rejected() {
    let snapshot: StoreSnapshot = toml::from_str(
        r#"
[[items]]
name = "r"
kind = "role"

[[edges]]
parent = "r"
child = "missing"
"#,
    )
    .unwrap();

    let err = MemoryItemStore::from_snapshot(snapshot).await.unwrap_err();
    assert_matches!(err, StoreError::UnknownItem { .. });
}

#[tokio::test]
async fn test_empty_snapshot() {
    let store = MemoryItemStore::from_snapshot(StoreSnapshot::default())
        .await
        .unwrap();
    assert!(store.snapshot().await.is_empty());
}
