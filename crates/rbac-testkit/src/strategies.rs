//! Property test strategies for RBAC types
//!
//! Names are drawn from small fixed pools so generated inputs collide often:
//! duplicate principals in a batch and repeated items in a desired set are
//! the interesting cases.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use rbac_core::{ItemName, PrincipalId};

/// Names `prefix0 .. prefix{count-1}`
pub fn pool(prefix: &str, count: usize) -> Vec<ItemName> {
    (0..count)
        .map(|i| ItemName::new(format!("{prefix}{i}")))
        .collect()
}

/// Strategy for desired sets over `pool`, duplicates allowed
pub fn arb_desired(pool: Vec<ItemName>) -> impl Strategy<Value = Vec<ItemName>> {
    let max = pool.len() + 2;
    prop::collection::vec(prop::sample::select(pool), 0..=max)
}

/// Strategy for principal lists over `u0 .. u{count-1}`, duplicates allowed
pub fn arb_principals(count: usize) -> impl Strategy<Value = Vec<PrincipalId>> {
    prop::collection::vec(
        (0..count).prop_map(|i| PrincipalId::new(format!("u{i}"))),
        0..=count + 2,
    )
}

/// Strategy for (principal, item) grants over the given pools
pub fn arb_grants(
    principals: usize,
    items: Vec<ItemName>,
) -> impl Strategy<Value = Vec<(PrincipalId, ItemName)>> {
    prop::collection::vec(
        (
            (0..principals).prop_map(|i| PrincipalId::new(format!("u{i}"))),
            prop::sample::select(items),
        ),
        0..16,
    )
}
