//! Store interfaces
//!
//! The authorization layer depends on a deliberately small surface:
//!
//! - [`HierarchyStore::children`] is the only hierarchy read.
//! - [`AssignmentStore`] reads direct assignments (singly or batched), grants
//!   and revokes single items, and opens transactions for bulk changes.
//!
//! Implementations must make a committed [`AssignmentTransaction`] visible
//! all at once: concurrent readers observe either the state before the
//! commit or the state after it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;
use crate::types::{Item, ItemKind, ItemName, PrincipalId};

/// One (principal, item) pair returned by a batched assignment read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRow {
    /// Principal holding the assignment
    pub principal: PrincipalId,
    /// Directly assigned item
    pub item: ItemName,
}

/// Read access to the parent → child relation
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Direct children of `parent`, in edge insertion order
    ///
    /// Unknown parents have no children; this is not an error.
    async fn children(&self, parent: &ItemName) -> StoreResult<Vec<Item>>;
}

/// Read and write access to direct assignments
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Items directly assigned to `principal`, optionally filtered by kind
    async fn assigned_items(
        &self,
        principal: &PrincipalId,
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<Item>>;

    /// Direct assignments of every principal in `principals`, in one read
    ///
    /// Principals without assignments contribute no rows.
    async fn assignment_rows(
        &self,
        principals: &[PrincipalId],
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<AssignmentRow>>;

    /// Grant `item` to `principal`; granting twice is not an error
    async fn assign(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()>;

    /// Remove the grant of `item` to `principal`, if present
    async fn revoke(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()>;

    /// Open a transaction for bulk assignment changes
    async fn begin(&self) -> StoreResult<Box<dyn AssignmentTransaction>>;
}

/// Atomic batch of assignment changes
///
/// Nothing staged in a transaction is visible until [`commit`] succeeds. A
/// failed commit leaves the store unchanged.
///
/// [`commit`]: AssignmentTransaction::commit
#[async_trait]
pub trait AssignmentTransaction: Send {
    /// Stage removal of `items` from `principal`
    async fn revoke_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()>;

    /// Stage grants of `items` to `principal`
    async fn assign_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()>;

    /// Apply every staged change atomically
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discard every staged change
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
