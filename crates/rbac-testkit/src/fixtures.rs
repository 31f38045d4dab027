//! Reusable store fixtures
//!
//! A [`Scenario`] is declared synchronously and built into a populated
//! [`MemoryItemStore`]. Every item gets the same [`fixture_time`] so built
//! stores compare equal across runs.

use chrono::{DateTime, TimeZone, Utc};
use rbac_core::{
    Assignment, HierarchyEdge, Item, ItemKind, ItemName, PrincipalId, RuleName, StoreResult,
};
use rbac_store::{MemoryItemStore, StoreSnapshot};

/// Timestamp stamped on every fixture item and assignment
pub fn fixture_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Declarative store contents
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    snapshot: StoreSnapshot,
}

impl Scenario {
    /// Empty scenario
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item of `kind`
    pub fn item(mut self, kind: ItemKind, name: &str) -> Self {
        self.snapshot.items.push(Item::new(kind, name, fixture_time()));
        self
    }

    /// Add a role
    pub fn role(self, name: &str) -> Self {
        self.item(ItemKind::Role, name)
    }

    /// Add a task
    pub fn task(self, name: &str) -> Self {
        self.item(ItemKind::Task, name)
    }

    /// Add an operation
    pub fn operation(self, name: &str) -> Self {
        self.item(ItemKind::Operation, name)
    }

    /// Add an item guarded by `rule`
    pub fn guarded(mut self, kind: ItemKind, name: &str, rule: &str) -> Self {
        self.snapshot
            .items
            .push(Item::new(kind, name, fixture_time()).with_rule(RuleName::from(rule)));
        self
    }

    /// Link `child` under `parent`
    pub fn child(mut self, parent: &str, child: &str) -> Self {
        self.snapshot.edges.push(HierarchyEdge::new(parent, child));
        self
    }

    /// Grant `item` to `principal`
    pub fn assign(mut self, item: &str, principal: &str) -> Self {
        self.snapshot.assignments.push(Assignment {
            item: ItemName::from(item),
            principal: PrincipalId::from(principal),
            created_at: fixture_time(),
        });
        self
    }

    /// Declared contents
    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Build the store, reporting invalid declarations
    pub async fn try_build(self) -> StoreResult<MemoryItemStore> {
        MemoryItemStore::from_snapshot(self.snapshot).await
    }

    /// Build the store; panics on invalid declarations
    pub async fn build(self) -> MemoryItemStore {
        self.try_build().await.expect("scenario should be valid")
    }
}

/// Role → task → operations hierarchy with nothing assigned
///
/// ```text
/// checkrole ─► checktask ─┬─► checkop
///                         └─► checkop2
/// checktask2
/// ```
pub fn checkrole_scenario() -> Scenario {
    Scenario::new()
        .role("checkrole")
        .task("checktask")
        .task("checktask2")
        .operation("checkop")
        .operation("checkop2")
        .child("checktask", "checkop")
        .child("checktask", "checkop2")
        .child("checkrole", "checktask")
}

/// Linear chain `prefix0 → prefix1 → … → prefix{len-1}`
pub fn chain_scenario(prefix: &str, len: usize) -> Scenario {
    let mut scenario = Scenario::new();
    for i in 0..len {
        scenario = scenario.task(&format!("{prefix}{i}"));
    }
    for i in 1..len {
        scenario = scenario.child(&format!("{prefix}{}", i - 1), &format!("{prefix}{i}"));
    }
    scenario
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac_core::HierarchyStore;

    #[tokio::test]
    async fn test_checkrole_scenario_builds() {
        let store = checkrole_scenario().build().await;
        let children = store.children(&"checktask".into()).await.unwrap();
        let names: Vec<_> = children.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["checkop", "checkop2"]);
    }

    #[tokio::test]
    async fn test_chain_links_consecutive_items() {
        let scenario = chain_scenario("n", 4);
        assert_eq!(scenario.snapshot().items.len(), 4);
        assert_eq!(scenario.snapshot().edges.len(), 3);
        assert_eq!(scenario.snapshot().edges[2], HierarchyEdge::new("n2", "n3"));
    }

    #[tokio::test]
    async fn test_invalid_scenario_reports_error() {
        let result = Scenario::new().role("r").assign("ghost", "u").try_build().await;
        assert!(result.is_err());
    }
}
