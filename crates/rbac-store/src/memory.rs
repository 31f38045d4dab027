//! Memory-backed item store
//!
//! All state lives behind one `RwLock`. Reads take the read lock once per
//! call, so a batched read is a single round trip, and a transaction commit
//! applies every staged change under one write lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use rbac_core::{
    Assignment, AssignmentRow, AssignmentStore, AssignmentTransaction, HierarchyEdge,
    HierarchyStore, Item, ItemKind, ItemName, PrincipalId, StoreError, StoreResult,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::snapshot::StoreSnapshot;
use crate::transaction::MemoryTransaction;

/// Tables of the memory store
///
/// Every collection is insertion ordered so reads are deterministic.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) items: IndexMap<ItemName, Item>,
    pub(crate) children: IndexMap<ItemName, IndexSet<ItemName>>,
    pub(crate) assignments: IndexMap<PrincipalId, IndexMap<ItemName, DateTime<Utc>>>,
}

impl State {
    pub(crate) fn require_item(&self, name: &ItemName) -> StoreResult<()> {
        if self.items.contains_key(name) {
            Ok(())
        } else {
            Err(StoreError::unknown_item(name.clone()))
        }
    }

    pub(crate) fn grant(&mut self, item: &ItemName, principal: &PrincipalId, at: DateTime<Utc>) {
        self.assignments
            .entry(principal.clone())
            .or_default()
            .entry(item.clone())
            .or_insert(at);
    }

    pub(crate) fn ungrant(&mut self, item: &ItemName, principal: &PrincipalId) {
        if let Some(items) = self.assignments.get_mut(principal) {
            items.shift_remove(item);
            if items.is_empty() {
                self.assignments.shift_remove(principal);
            }
        }
    }

    fn assigned(&self, principal: &PrincipalId, kind: Option<ItemKind>) -> Vec<&Item> {
        self.assignments
            .get(principal)
            .into_iter()
            .flat_map(|items| items.keys())
            .filter_map(|name| self.items.get(name))
            .filter(|item| item.matches_kind(kind))
            .collect()
    }
}

/// In-memory item store
#[derive(Debug, Clone, Default)]
pub struct MemoryItemStore {
    state: Arc<RwLock<State>>,
}

impl MemoryItemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item after validating its fields
    ///
    /// The name is required and must be unique.
    pub async fn insert_item(&self, item: Item) -> StoreResult<()> {
        if item.name.is_empty() {
            return Err(StoreError::invalid_item("name", "Name is required"));
        }

        let mut state = self.state.write().await;
        if state.items.contains_key(&item.name) {
            return Err(StoreError::duplicate_item(item.name));
        }

        tracing::debug!(item = %item.name, kind = %item.kind, "Inserted item");
        state.items.insert(item.name.clone(), item);
        Ok(())
    }

    /// Create and insert an item of `kind` named `name`
    pub async fn create_item(
        &self,
        kind: ItemKind,
        name: impl Into<ItemName>,
    ) -> StoreResult<Item> {
        let item = Item::new(kind, name, Utc::now());
        self.insert_item(item.clone()).await?;
        Ok(item)
    }

    /// Load one item by name
    pub async fn load_item(&self, name: &ItemName) -> StoreResult<Item> {
        let state = self.state.read().await;
        state
            .items
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::unknown_item(name.clone()))
    }

    /// Delete an item together with its edges and assignments
    ///
    /// Returns whether an item was removed.
    pub async fn delete_item(&self, name: &ItemName) -> StoreResult<bool> {
        if name.is_empty() {
            return Err(StoreError::invalid_item("name", "Name is required"));
        }

        let mut state = self.state.write().await;
        if state.items.shift_remove(name).is_none() {
            return Ok(false);
        }

        state.children.shift_remove(name);
        for children in state.children.values_mut() {
            children.shift_remove(name);
        }
        for items in state.assignments.values_mut() {
            items.shift_remove(name);
        }
        state.assignments.retain(|_, items| !items.is_empty());

        tracing::debug!(item = %name, "Deleted item");
        Ok(true)
    }

    /// Link `child` under `parent`
    ///
    /// Both items must exist and differ. Linking twice is not an error.
    pub async fn add_child(&self, parent: &ItemName, child: &ItemName) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.require_item(parent)?;
        state.require_item(child)?;

        if parent == child {
            return Err(StoreError::SelfReference {
                name: parent.clone(),
            });
        }

        state
            .children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        Ok(())
    }

    /// Remove the link from `parent` to `child`, if present
    pub async fn remove_child(&self, parent: &ItemName, child: &ItemName) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(children) = state.children.get_mut(parent) {
            children.shift_remove(child);
            if children.is_empty() {
                state.children.shift_remove(parent);
            }
        }
        Ok(())
    }

    /// Build a store from a snapshot, validating every reference
    pub async fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let store = Self::new();
        for item in snapshot.items {
            store.insert_item(item).await?;
        }
        for edge in &snapshot.edges {
            store.add_child(&edge.parent, &edge.child).await?;
        }

        {
            let mut state = store.state.write().await;
            for assignment in &snapshot.assignments {
                state.require_item(&assignment.item)?;
                state.grant(
                    &assignment.item,
                    &assignment.principal,
                    assignment.created_at,
                );
            }
        }

        Ok(store)
    }

    /// Capture the whole store as a snapshot
    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;

        let edges = state
            .children
            .iter()
            .flat_map(|(parent, children)| {
                children
                    .iter()
                    .map(move |child| HierarchyEdge::new(parent.clone(), child.clone()))
            })
            .collect();

        let assignments = state
            .assignments
            .iter()
            .flat_map(|(principal, items)| {
                items.iter().map(move |(item, created_at)| Assignment {
                    item: item.clone(),
                    principal: principal.clone(),
                    created_at: *created_at,
                })
            })
            .collect();

        StoreSnapshot {
            items: state.items.values().cloned().collect(),
            edges,
            assignments,
        }
    }
}

#[async_trait]
impl HierarchyStore for MemoryItemStore {
    async fn children(&self, parent: &ItemName) -> StoreResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state
            .children
            .get(parent)
            .into_iter()
            .flatten()
            .filter_map(|name| state.items.get(name).cloned())
            .collect())
    }
}

#[async_trait]
impl AssignmentStore for MemoryItemStore {
    async fn assigned_items(
        &self,
        principal: &PrincipalId,
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state.assigned(principal, kind).into_iter().cloned().collect())
    }

    async fn assignment_rows(
        &self,
        principals: &[PrincipalId],
        kind: Option<ItemKind>,
    ) -> StoreResult<Vec<AssignmentRow>> {
        let distinct: IndexSet<&PrincipalId> = principals.iter().collect();

        let state = self.state.read().await;
        Ok(distinct
            .into_iter()
            .flat_map(|principal| {
                state
                    .assigned(principal, kind)
                    .into_iter()
                    .map(move |item| AssignmentRow {
                        principal: principal.clone(),
                        item: item.name.clone(),
                    })
            })
            .collect())
    }

    async fn assign(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.require_item(item)?;
        state.grant(item, principal, Utc::now());
        Ok(())
    }

    async fn revoke(&self, item: &ItemName, principal: &PrincipalId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ungrant(item, principal);
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Box<dyn AssignmentTransaction>> {
        Ok(Box::new(MemoryTransaction::new(Arc::clone(&self.state))))
    }
}
