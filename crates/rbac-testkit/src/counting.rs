//! Call counting
//!
//! [`CountingStore`] records how often each store operation runs, so tests
//! can pin down round trips (one read per batch) and writes (none for a
//! no-op sync).

use async_trait::async_trait;
use parking_lot::Mutex;
use rbac_core::{
    AssignmentRow, AssignmentStore, AssignmentTransaction, HierarchyStore, Item, ItemKind,
    ItemName, PrincipalId, StoreResult,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::faults::StoreOperation;

type Counts = Arc<Mutex<HashMap<StoreOperation, usize>>>;

fn record(counts: &Counts, operation: StoreOperation) {
    *counts.lock().entry(operation).or_insert(0) += 1;
}

/// Store wrapper that counts calls per operation
#[derive(Debug, Clone)]
pub struct CountingStore<S> {
    inner: S,
    counts: Counts,
}

impl<S> CountingStore<S> {
    /// Wrap `inner` with every count at zero
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counts: Arc::default(),
        }
    }

    /// Calls of `operation` so far
    pub fn count(&self, operation: StoreOperation) -> usize {
        self.counts.lock().get(&operation).copied().unwrap_or(0)
    }

    /// Calls of every operation that changes stored state
    pub fn writes(&self) -> usize {
        self.counts
            .lock()
            .iter()
            .filter(|(operation, _)| operation.is_write())
            .map(|(_, count)| count)
            .sum()
    }

    /// Calls of every operation
    pub fn total(&self) -> usize {
        self.counts.lock().values().sum()
    }

    /// Zero every count
    pub fn reset(&self) {
        self.counts.lock().clear();
    }

    /// Wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: HierarchyStore> HierarchyStore for CountingStore<S> {
    async fn children(&self, parent: &ItemName) -> StoreResult<Vec<Item>> {
        record(&self.counts, StoreOperation::Children);
        self.inner.children(parent).await
    }
}

#[async_trait]
impl<S: AssignmentStore> AssignmentStore for CountingStore<S> {
    async fn assigned_items(
        &self,
        principal: &PrincipalId,
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<Item>> {
        record(&self.counts, StoreOperation::AssignedItems);
        self.inner.assigned_items(principal, kind).await
    }

    async fn assignment_rows(
        &self,
        principals: &[PrincipalId],
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<AssignmentRow>> {
        record(&self.counts, StoreOperation::AssignmentRows);
        self.inner.assignment_rows(principals, kind).await
    }

    async fn assign(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        record(&self.counts, StoreOperation::Assign);
        self.inner.assign(item, principal).await
    }

    async fn revoke(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        record(&self.counts, StoreOperation::Revoke);
        self.inner.revoke(item, principal).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn AssignmentTransaction>> {
        record(&self.counts, StoreOperation::Begin);
        let inner = self.inner.begin().await?;
        Ok(Box::new(CountingTransaction {
            inner,
            counts: Arc::clone(&self.counts),
        }))
    }
}

struct CountingTransaction {
    inner: Box<dyn AssignmentTransaction>,
    counts: Counts,
}

#[async_trait]
impl AssignmentTransaction for CountingTransaction {
    async fn revoke_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        record(&self.counts, StoreOperation::RevokeAll);
        self.inner.revoke_all(principal, items).await
    }

    async fn assign_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        record(&self.counts, StoreOperation::AssignAll);
        self.inner.assign_all(principal, items).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        record(&self.counts, StoreOperation::Commit);
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        record(&self.counts, StoreOperation::Rollback);
        self.inner.rollback().await
    }
}
