//! Staged assignment transactions
//!
//! Changes are buffered locally and applied under a single write lock at
//! commit. Commit validates every referenced item before touching state, so
//! a failed commit applies nothing.

use async_trait::async_trait;
use chrono::Utc;
use rbac_core::{AssignmentTransaction, ItemName, PrincipalId, StoreResult};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::memory::State;

#[derive(Debug, Clone)]
enum StagedChange {
    Revoke {
        principal: PrincipalId,
        item: ItemName,
    },
    Assign {
        principal: PrincipalId,
        item: ItemName,
    },
}

/// Transaction over a [`MemoryItemStore`](crate::MemoryItemStore)
#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<RwLock<State>>,
    staged: Vec<StagedChange>,
}

impl MemoryTransaction {
    pub(crate) fn new(state: Arc<RwLock<State>>) -> Self {
        Self {
            state,
            staged: Vec::new(),
        }
    }

    /// Number of changes staged so far
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

#[async_trait]
impl AssignmentTransaction for MemoryTransaction {
    async fn revoke_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        self.staged
            .extend(items.iter().map(|item| StagedChange::Revoke {
                principal: principal.clone(),
                item: item.clone(),
            }));
        Ok(())
    }

    async fn assign_all(&mut self, principal: &PrincipalId, items: &[ItemName]) -> StoreResult<()> {
        self.staged
            .extend(items.iter().map(|item| StagedChange::Assign {
                principal: principal.clone(),
                item: item.clone(),
            }));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut state = self.state.write().await;

        for change in &self.staged {
            if let StagedChange::Assign { item, .. } = change {
                state.require_item(item)?;
            }
        }

        let now = Utc::now();
        for change in &self.staged {
            match change {
                StagedChange::Revoke { principal, item } => state.ungrant(item, principal),
                StagedChange::Assign { principal, item } => state.grant(item, principal, now),
            }
        }

        tracing::debug!(changes = self.staged.len(), "Committed assignment transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        tracing::debug!(
            changes = self.staged.len(),
            "Rolled back assignment transaction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryItemStore;
    use assert_matches::assert_matches;
    use rbac_core::{AssignmentStore, ItemKind, ItemName, PrincipalId, StoreError};

    #[tokio::test]
    async fn test_nothing_visible_before_commit() {
        let store = MemoryItemStore::new();
        store.create_item(ItemKind::Role, "r").await.unwrap();
        let u = PrincipalId::from("u");

        let mut tx = store.begin().await.unwrap();
        tx.assign_all(&u, &[ItemName::from("r")]).await.unwrap();
        assert!(store.assigned_items(&u, None).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.assigned_items(&u, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = MemoryItemStore::new();
        store.create_item(ItemKind::Role, "r").await.unwrap();
        let u = PrincipalId::from("u");
        store.assign(&ItemName::from("r"), &u).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.revoke_all(&u, &[ItemName::from("r")]).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.assigned_items(&u, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let store = MemoryItemStore::new();
        store.create_item(ItemKind::Role, "a").await.unwrap();
        store.create_item(ItemKind::Role, "b").await.unwrap();
        let u = PrincipalId::from("u");
        store.assign(&ItemName::from("a"), &u).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.revoke_all(&u, &[ItemName::from("a")]).await.unwrap();
        tx.assign_all(&u, &[ItemName::from("b"), ItemName::from("ghost")])
            .await
            .unwrap();
        let err = tx.commit().await.unwrap_err();
        assert_matches!(err, StoreError::UnknownItem { .. });

        let names: Vec<_> = store
            .assigned_items(&u, None)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec![ItemName::from("a")]);
    }
}
