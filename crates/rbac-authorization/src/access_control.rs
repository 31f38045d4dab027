//! Access control facade
//!
//! Bundles the resolver, the query engine and the reconciler over one shared
//! store so callers configure them once.

use rbac_core::{
    AssignmentStore, HierarchyStore, ItemKind, ItemName, PrincipalId, RbacConfig,
};
use std::sync::Arc;
use tracing::info;

use crate::errors::Result;
use crate::query::{AssignmentQuery, BatchAssignments};
use crate::reconcile::{AssignmentReconciler, SyncOutcome};
use crate::resolver::HierarchyResolver;
use crate::rules::RuleEvaluator;

/// Entry point for access checks and assignment management
pub struct AccessControl<S> {
    store: Arc<S>,
    resolver: HierarchyResolver<S>,
    query: AssignmentQuery<S>,
    reconciler: AssignmentReconciler<S>,
}

impl<S> Clone for AccessControl<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: self.resolver.clone(),
            query: self.query.clone(),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl<S> AccessControl<S>
where
    S: HierarchyStore + AssignmentStore,
{
    /// Create the facade over `store` with settings from `config`
    pub fn new(store: Arc<S>, config: &RbacConfig) -> Self {
        Self {
            resolver: HierarchyResolver::from_config(Arc::clone(&store), config),
            query: AssignmentQuery::new(Arc::clone(&store)),
            reconciler: AssignmentReconciler::new(Arc::clone(&store)),
            store,
        }
    }

    /// Install the evaluator consulted for items that carry a rule
    pub fn with_rule_evaluator(mut self, rules: Arc<dyn RuleEvaluator>) -> Self {
        self.resolver = self.resolver.with_rule_evaluator(rules);
        self
    }

    /// See [`HierarchyResolver::has_access`]
    pub async fn has_access(&self, principal: &PrincipalId, target: &ItemName) -> Result<bool> {
        self.resolver.has_access(principal, target).await
    }

    /// See [`HierarchyResolver::accessible_items`]
    pub async fn accessible_items(&self, principal: &PrincipalId) -> Result<Vec<ItemName>> {
        self.resolver.accessible_items(principal).await
    }

    /// See [`AssignmentQuery::query`]
    pub async fn query(
        &self,
        kind: Option<ItemKind>,
        principal: &PrincipalId,
    ) -> Result<Vec<ItemName>> {
        self.query.query(kind, principal).await
    }

    /// See [`AssignmentQuery::batch_query`]
    pub async fn batch_query(
        &self,
        kind: Option<ItemKind>,
        principals: &[PrincipalId],
    ) -> Result<BatchAssignments> {
        self.query.batch_query(kind, principals).await
    }

    /// See [`AssignmentReconciler::sync`]
    pub async fn sync(&self, principal: &PrincipalId, desired: &[ItemName]) -> Result<SyncOutcome> {
        self.reconciler.sync(principal, desired).await
    }

    /// Grant one item directly
    pub async fn assign(&self, item: &ItemName, principal: &PrincipalId) -> Result<()> {
        self.store.assign(item, principal).await?;
        info!(item = %item, principal = %principal, "Assigned item");
        Ok(())
    }

    /// Remove one direct grant
    pub async fn revoke(&self, item: &ItemName, principal: &PrincipalId) -> Result<()> {
        self.store.revoke(item, principal).await?;
        info!(item = %item, principal = %principal, "Revoked item");
        Ok(())
    }

    /// Shared store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Hierarchy resolver
    pub fn resolver(&self) -> &HierarchyResolver<S> {
        &self.resolver
    }

    /// Query engine
    pub fn assignment_query(&self) -> &AssignmentQuery<S> {
        &self.query
    }

    /// Reconciler
    pub fn reconciler(&self) -> &AssignmentReconciler<S> {
        &self.reconciler
    }
}
