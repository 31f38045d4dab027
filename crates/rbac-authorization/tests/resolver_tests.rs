//! Hierarchy resolution against the memory store

use assert_matches::assert_matches;
use async_trait::async_trait;
use rbac_authorization::{
    AccessControl, AuthorizationError, HierarchyResolver, RuleError, RuleEvaluator,
};
use rbac_core::{
    AssignmentStore, Item, ItemKind, ItemName, PrincipalId, RbacConfig, RuleName, StoreError,
};
use rbac_store::MemoryItemStore;
use rbac_testkit::{
    chain_scenario, checkrole_scenario, init_test_tracing, CountingStore, FaultyStore, Scenario,
    StoreOperation,
};
use std::sync::Arc;

fn name(s: &str) -> ItemName {
    ItemName::from(s)
}

fn resolver(store: &MemoryItemStore) -> HierarchyResolver<MemoryItemStore> {
    HierarchyResolver::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn checkrole_grants_follow_the_hierarchy() {
    init_test_tracing();
    let store = checkrole_scenario().build().await;
    let resolver = resolver(&store);
    let u = PrincipalId::from("u");

    assert!(!resolver.has_access(&u, &name("checkrole")).await.unwrap());

    store.assign(&name("checkrole"), &u).await.unwrap();

    assert!(resolver.has_access(&u, &name("checkrole")).await.unwrap());
    assert!(resolver.has_access(&u, &name("checktask")).await.unwrap());
    assert!(!resolver.has_access(&u, &name("checktask2")).await.unwrap());
    assert!(resolver.has_access(&u, &name("checkop")).await.unwrap());
    assert!(resolver.has_access(&u, &name("checkop2")).await.unwrap());
}

#[tokio::test]
async fn unassigned_leaf_is_denied() {
    let store = Scenario::new().operation("lonely").build().await;
    let allowed = resolver(&store)
        .has_access(&PrincipalId::from("u"), &name("lonely"))
        .await
        .unwrap();
    assert!(!allowed);
}

#[tokio::test]
async fn unknown_target_is_denied() {
    let store = checkrole_scenario().assign("checkrole", "u").build().await;
    let allowed = resolver(&store)
        .has_access(&PrincipalId::from("u"), &name("missing"))
        .await
        .unwrap();
    assert!(!allowed);
}

#[tokio::test]
async fn direct_assignment_grants_without_hierarchy_reads() {
    let memory = checkrole_scenario().assign("checkrole", "u").build().await;
    let store = FaultyStore::new(memory);
    store.fail_on(StoreOperation::Children);

    let resolver = HierarchyResolver::new(Arc::new(store));
    let allowed = resolver
        .has_access(&PrincipalId::from("u"), &name("checkrole"))
        .await
        .unwrap();
    assert!(allowed);
}

#[tokio::test]
async fn store_failures_propagate() {
    let memory = checkrole_scenario().assign("checkrole", "u").build().await;
    let store = Arc::new(FaultyStore::new(memory));
    let resolver = HierarchyResolver::new(Arc::clone(&store));
    let u = PrincipalId::from("u");

    store.fail_on(StoreOperation::Children);
    let err = resolver.has_access(&u, &name("checkop")).await.unwrap_err();
    assert_matches!(err, AuthorizationError::Store(StoreError::Injected { .. }));

    store.heal_all();
    store.fail_on(StoreOperation::AssignedItems);
    let err = resolver.has_access(&u, &name("checkrole")).await.unwrap_err();
    assert_matches!(err, AuthorizationError::Store(StoreError::Injected { .. }));
}

#[tokio::test]
async fn chain_within_cap_is_resolved() {
    // n0 is expanded at depth 0, n4 is found at depth 4 and has no children
    let store = chain_scenario("n", 5).assign("n0", "u").build().await;
    let resolver = resolver(&store);
    let u = PrincipalId::from("u");

    assert!(resolver.has_access(&u, &name("n4")).await.unwrap());
    assert!(!resolver.has_access(&u, &name("elsewhere")).await.unwrap());
}

#[tokio::test]
async fn chain_beyond_cap_is_an_error() {
    let store = chain_scenario("n", 6).assign("n0", "u").build().await;
    let resolver = resolver(&store);
    let u = PrincipalId::from("u");

    // Reachable before the cap
    assert!(resolver.has_access(&u, &name("n4")).await.unwrap());

    let err = resolver.has_access(&u, &name("n5")).await.unwrap_err();
    assert_matches!(
        err,
        AuthorizationError::RecursionLimitExceeded { ref item, max_depth: 3, ref target }
            if item.as_str() == "n4" && target.as_ref().map(ItemName::as_str) == Some("n5")
    );
    assert!(err.is_hierarchy_anomaly());

    let err = resolver.accessible_items(&u).await.unwrap_err();
    assert_matches!(err, AuthorizationError::RecursionLimitExceeded { target: None, .. });
}

#[tokio::test]
async fn cap_follows_configuration() {
    let store = chain_scenario("n", 6).assign("n0", "u").build().await;
    let u = PrincipalId::from("u");

    let mut config = RbacConfig::default();
    config.merge_with_vars([("RBAC_RESOLVER_MAX_DEPTH", "unbounded")]).unwrap();
    let unbounded = HierarchyResolver::from_config(Arc::new(store.clone()), &config);
    assert_eq!(unbounded.max_depth(), None);
    assert!(unbounded.has_access(&u, &name("n5")).await.unwrap());

    let shallow = resolver(&store).with_max_depth(Some(1));
    let err = shallow.has_access(&u, &name("n3")).await.unwrap_err();
    assert_matches!(err, AuthorizationError::RecursionLimitExceeded { max_depth: 1, .. });
}

fn cyclic() -> Scenario {
    Scenario::new()
        .role("a")
        .task("b")
        .task("c")
        .operation("leaf")
        .child("a", "b")
        .child("b", "c")
        .child("c", "b")
        .child("c", "leaf")
        .assign("a", "u")
}

#[tokio::test]
async fn cycle_is_reported_when_target_is_unreachable() {
    let store = cyclic().build().await;
    let u = PrincipalId::from("u");

    for max_depth in [Some(3), None] {
        let resolver = resolver(&store).with_max_depth(max_depth);
        let err = resolver.has_access(&u, &name("nowhere")).await.unwrap_err();
        assert_matches!(
            err,
            AuthorizationError::HierarchyCycle { ref path }
                if path == &vec![name("b"), name("c"), name("b")]
        );
    }
}

#[tokio::test]
async fn cycle_does_not_mask_a_grant() {
    let store = cyclic().build().await;
    let resolver = resolver(&store).with_max_depth(None);
    let u = PrincipalId::from("u");

    assert!(resolver.has_access(&u, &name("leaf")).await.unwrap());
    assert!(resolver.has_access(&u, &name("c")).await.unwrap());
}

#[tokio::test]
async fn diamond_is_expanded_once() {
    let memory = Scenario::new()
        .role("r")
        .task("a")
        .task("b")
        .operation("x")
        .child("r", "a")
        .child("r", "b")
        .child("a", "x")
        .child("b", "x")
        .assign("r", "u")
        .build()
        .await;
    let store = Arc::new(CountingStore::new(memory));
    let resolver = HierarchyResolver::new(Arc::clone(&store));
    let u = PrincipalId::from("u");

    assert!(!resolver.has_access(&u, &name("nowhere")).await.unwrap());
    assert_eq!(store.count(StoreOperation::Children), 4);
    assert_eq!(store.count(StoreOperation::AssignedItems), 1);

    let items = resolver.accessible_items(&u).await.unwrap();
    assert_eq!(items, vec![name("r"), name("a"), name("b"), name("x")]);
}

#[tokio::test]
async fn accessible_items_merge_every_assignment() {
    let store = checkrole_scenario()
        .assign("checkrole", "u")
        .assign("checktask2", "u")
        .assign("checkop", "u")
        .build()
        .await;

    let items = resolver(&store)
        .accessible_items(&PrincipalId::from("u"))
        .await
        .unwrap();
    assert_eq!(
        items,
        vec![
            name("checkrole"),
            name("checktask2"),
            name("checkop"),
            name("checktask"),
            name("checkop2"),
        ]
    );
}

struct FixedRule {
    admit: Result<bool, RuleError>,
}

#[async_trait]
impl RuleEvaluator for FixedRule {
    async fn evaluate(
        &self,
        rule: &RuleName,
        _principal: &PrincipalId,
        _item: &Item,
    ) -> Result<bool, RuleError> {
        assert_eq!(rule.as_str(), "business_hours");
        self.admit.clone()
    }
}

fn guarded() -> Scenario {
    Scenario::new()
        .role("r")
        .guarded(ItemKind::Task, "t", "business_hours")
        .operation("op")
        .child("r", "t")
        .child("t", "op")
        .assign("r", "u")
}

#[tokio::test]
async fn rule_gates_grant_and_traversal() {
    let store = guarded().build().await;
    let u = PrincipalId::from("u");

    let open = resolver(&store).with_rule_evaluator(Arc::new(FixedRule { admit: Ok(true) }));
    assert!(open.has_access(&u, &name("t")).await.unwrap());
    assert!(open.has_access(&u, &name("op")).await.unwrap());

    let closed = resolver(&store).with_rule_evaluator(Arc::new(FixedRule { admit: Ok(false) }));
    assert!(!closed.has_access(&u, &name("t")).await.unwrap());
    assert!(!closed.has_access(&u, &name("op")).await.unwrap());
    assert!(closed.has_access(&u, &name("r")).await.unwrap());
}

#[tokio::test]
async fn rule_without_evaluator_is_an_error() {
    let store = guarded().build().await;
    let err = resolver(&store)
        .has_access(&PrincipalId::from("u"), &name("op"))
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::RuleUnavailable { ref item, .. } if item.as_str() == "t");
}

fn guarded_sibling(edges: &[(&str, &str)]) -> Scenario {
    let mut scenario = Scenario::new()
        .role("r")
        .guarded(ItemKind::Task, "t", "business_hours")
        .operation("op")
        .operation("below");
    for (parent, child) in edges {
        scenario = scenario.child(parent, child);
    }
    scenario.assign("r", "u")
}

#[tokio::test]
async fn unevaluable_rule_does_not_depend_on_edge_order() {
    let u = PrincipalId::from("u");
    let orders: [&[(&str, &str)]; 2] = [
        &[("r", "op"), ("r", "t"), ("t", "below")],
        &[("r", "t"), ("r", "op"), ("t", "below")],
    ];

    for edges in orders {
        let store = guarded_sibling(edges).build().await;
        let resolver = resolver(&store);

        // A sibling branch still grants access
        assert!(resolver.has_access(&u, &name("op")).await.unwrap());

        // Nothing reaches the target, so the rule failure surfaces
        for target in ["t", "below", "nowhere"] {
            let err = resolver.has_access(&u, &name(target)).await.unwrap_err();
            assert_matches!(
                err,
                AuthorizationError::RuleUnavailable { ref item, .. } if item.as_str() == "t"
            );
        }
    }
}

#[tokio::test]
async fn depth_breach_outranks_rule_failure() {
    let store = chain_scenario("n", 6)
        .guarded(ItemKind::Task, "g", "business_hours")
        .child("n0", "g")
        .assign("n0", "u")
        .build()
        .await;

    let err = resolver(&store)
        .has_access(&PrincipalId::from("u"), &name("n5"))
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::RecursionLimitExceeded { .. });
}

#[tokio::test]
async fn rule_failure_is_an_error() {
    let store = guarded().build().await;
    let failing = resolver(&store).with_rule_evaluator(Arc::new(FixedRule {
        admit: Err(RuleError::new("clock unavailable")),
    }));

    let err = failing
        .has_access(&PrincipalId::from("u"), &name("op"))
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::Rule { .. });
    assert!(err.to_string().contains("clock unavailable"));
}

#[tokio::test]
async fn facade_assign_then_revoke() {
    let store = Arc::new(checkrole_scenario().build().await);
    let access = AccessControl::new(store, &RbacConfig::default());
    let u = PrincipalId::from("u");

    access.assign(&name("checktask"), &u).await.unwrap();
    assert!(access.has_access(&u, &name("checkop2")).await.unwrap());
    assert!(!access.has_access(&u, &name("checkrole")).await.unwrap());

    access.revoke(&name("checktask"), &u).await.unwrap();
    assert!(!access.has_access(&u, &name("checkop2")).await.unwrap());

    let err = access.assign(&name("ghost"), &u).await.unwrap_err();
    assert_matches!(err, AuthorizationError::Store(StoreError::UnknownItem { .. }));
}
