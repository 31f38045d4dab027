//! Direct assignment queries
//!
//! Queries list only direct assignments; nothing here walks the hierarchy.

use indexmap::IndexMap;
use rbac_core::{AssignmentStore, ItemKind, ItemName, PrincipalId};
use std::ops::Index;
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;

/// Lists direct assignments
pub struct AssignmentQuery<S> {
    store: Arc<S>,
}

impl<S> Clone for AssignmentQuery<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AssignmentStore> AssignmentQuery<S> {
    /// Create a query engine over `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Names of items directly assigned to `principal`, optionally of one kind
    ///
    /// A principal without matching assignments yields an empty vector.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn query(
        &self,
        kind: Option<ItemKind>,
        principal: &PrincipalId,
    ) -> Result<Vec<ItemName>> {
        let items = self.store.assigned_items(principal, kind).await?;
        Ok(items.into_iter().map(|item| item.name).collect())
    }

    /// [`query`](Self::query) for many principals with one store read
    ///
    /// The result has one entry per requested principal, in request order,
    /// including empty entries.
    #[tracing::instrument(level = "debug", skip(self, principals), fields(principals = principals.len()))]
    pub async fn batch_query(
        &self,
        kind: Option<ItemKind>,
        principals: &[PrincipalId],
    ) -> Result<BatchAssignments> {
        if principals.is_empty() {
            return Ok(BatchAssignments::default());
        }

        let rows = self.store.assignment_rows(principals, kind).await?;
        debug!(rows = rows.len(), "Fetched batched assignments");

        let mut grouped: IndexMap<&PrincipalId, Vec<ItemName>> =
            principals.iter().map(|principal| (principal, Vec::new())).collect();
        for row in rows {
            if let Some(items) = grouped.get_mut(&row.principal) {
                items.push(row.item);
            }
        }

        let entries = principals
            .iter()
            .map(|principal| {
                let items = grouped.get(principal).cloned().unwrap_or_default();
                (principal.clone(), items)
            })
            .collect();

        Ok(BatchAssignments { entries })
    }
}

/// Result of a batched query, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAssignments {
    entries: Vec<(PrincipalId, Vec<ItemName>)>,
}

impl BatchAssignments {
    /// Number of entries, equal to the number of requested principals
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no principals were requested
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at request position `index`
    pub fn get_index(&self, index: usize) -> Option<(&PrincipalId, &[ItemName])> {
        self.entries
            .get(index)
            .map(|(principal, items)| (principal, items.as_slice()))
    }

    /// Items of the first entry for `principal`
    pub fn get(&self, principal: &PrincipalId) -> Option<&[ItemName]> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == principal)
            .map(|(_, items)| items.as_slice())
    }

    /// Entries in request order
    pub fn iter(&self) -> impl Iterator<Item = (&PrincipalId, &[ItemName])> {
        self.entries
            .iter()
            .map(|(principal, items)| (principal, items.as_slice()))
    }

    /// Consume into `(principal, items)` pairs in request order
    pub fn into_entries(self) -> Vec<(PrincipalId, Vec<ItemName>)> {
        self.entries
    }
}

impl Index<usize> for BatchAssignments {
    type Output = [ItemName];

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index].1
    }
}
