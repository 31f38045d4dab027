//! Fault injection
//!
//! [`FaultyStore`] wraps any store and fails the operations a test arms with
//! [`StoreError::Injected`]. Transactions opened through it are wrapped too,
//! so individual transaction steps can fail.

use async_trait::async_trait;
use parking_lot::Mutex;
use rbac_core::{
    AssignmentRow, AssignmentStore, AssignmentTransaction, HierarchyStore, Item, ItemKind,
    ItemName, PrincipalId, StoreError, StoreResult,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Store calls that can be failed or counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `HierarchyStore::children`
    Children,
    /// `AssignmentStore::assigned_items`
    AssignedItems,
    /// `AssignmentStore::assignment_rows`
    AssignmentRows,
    /// `AssignmentStore::assign`
    Assign,
    /// `AssignmentStore::revoke`
    Revoke,
    /// `AssignmentStore::begin`
    Begin,
    /// `AssignmentTransaction::revoke_all`
    RevokeAll,
    /// `AssignmentTransaction::assign_all`
    AssignAll,
    /// `AssignmentTransaction::commit`
    Commit,
    /// `AssignmentTransaction::rollback`
    Rollback,
}

impl StoreOperation {
    /// Operation name as it appears in injected errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Children => "children",
            Self::AssignedItems => "assigned_items",
            Self::AssignmentRows => "assignment_rows",
            Self::Assign => "assign",
            Self::Revoke => "revoke",
            Self::Begin => "begin",
            Self::RevokeAll => "revoke_all",
            Self::AssignAll => "assign_all",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }

    /// Whether the operation changes stored state
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Assign | Self::Revoke | Self::RevokeAll | Self::AssignAll | Self::Commit
        )
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Armed = Arc<Mutex<HashSet<StoreOperation>>>;

fn check(armed: &Armed, operation: StoreOperation) -> StoreResult<()> {
    if armed.lock().contains(&operation) {
        tracing::debug!(%operation, "Injecting store failure");
        return Err(StoreError::injected(operation.as_str()));
    }
    Ok(())
}

/// Store wrapper that fails armed operations
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    armed: Armed,
}

impl<S> FaultyStore<S> {
    /// Wrap `inner` with nothing armed
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: Arc::default(),
        }
    }

    /// Make every later call of `operation` fail
    pub fn fail_on(&self, operation: StoreOperation) -> &Self {
        self.armed.lock().insert(operation);
        self
    }

    /// Let `operation` succeed again
    pub fn heal(&self, operation: StoreOperation) {
        self.armed.lock().remove(&operation);
    }

    /// Disarm every operation
    pub fn heal_all(&self) {
        self.armed.lock().clear();
    }

    /// Wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: HierarchyStore> HierarchyStore for FaultyStore<S> {
    async fn children(&self, parent: &ItemName) -> StoreResult<Vec<Item>> {
        check(&self.armed, StoreOperation::Children)?;
        self.inner.children(parent).await
    }
}

#[async_trait]
impl<S: AssignmentStore> AssignmentStore for FaultyStore<S> {
    async fn assigned_items(
        &self,
        principal: &PrincipalId,
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<Item>> {
        check(&self.armed, StoreOperation::AssignedItems)?;
        self.inner.assigned_items(principal, kind).await
    }

    async fn assignment_rows(
        &self,
        principals: &[PrincipalId],
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<AssignmentRow>> {
        check(&self.armed, StoreOperation::AssignmentRows)?;
        self.inner.assignment_rows(principals, kind).await
    }

    async fn assign(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        check(&self.armed, StoreOperation::Assign)?;
        self.inner.assign(item, principal).await
    }

    async fn revoke(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        check(&self.armed, StoreOperation::Revoke)?;
        self.inner.revoke(item, principal).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn AssignmentTransaction>> {
        check(&self.armed, StoreOperation::Begin)?;
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            armed: Arc::clone(&self.armed),
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn AssignmentTransaction>,
    armed: Armed,
}

#[async_trait]
impl AssignmentTransaction for FaultyTransaction {
    async fn revoke_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        check(&self.armed, StoreOperation::RevokeAll)?;
        self.inner.revoke_all(principal, items).await
    }

    async fn assign_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        check(&self.armed, StoreOperation::AssignAll)?;
        self.inner.assign_all(principal, items).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        check(&self.armed, StoreOperation::Commit)?;
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        // The staged changes are discarded either way
        let result = check(&self.armed, StoreOperation::Rollback);
        self.inner.rollback().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rbac_store::MemoryItemStore;

    #[tokio::test]
    async fn test_armed_operation_fails_until_healed() {
        let memory = MemoryItemStore::new();
        memory.create_item(ItemKind::Role, "r").await.unwrap();
        let store = FaultyStore::new(memory);
        let u = PrincipalId::from("u");

        store.fail_on(StoreOperation::Assign);
        let err = store.assign(&"r".into(), &u).await.unwrap_err();
        assert_matches!(err, StoreError::Injected { ref operation } if operation == "assign");

        store.heal(StoreOperation::Assign);
        store.assign(&"r".into(), &u).await.unwrap();
        assert_eq!(store.assigned_items(&u, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let memory = MemoryItemStore::new();
        memory.create_item(ItemKind::Role, "r").await.unwrap();
        let store = FaultyStore::new(memory.clone());
        store.fail_on(StoreOperation::Commit);

        let u = PrincipalId::from("u");
        let mut tx = store.begin().await.unwrap();
        tx.assign_all(&u, &["r".into()]).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert!(memory.assigned_items(&u, None).await.unwrap().is_empty());
    }
}
