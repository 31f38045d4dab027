//! Assignment reconciliation
//!
//! `sync` treats a principal's direct assignments as one replaceable set.
//! It computes the delta against the stored set and applies it in a single
//! transaction. An empty delta performs no write at all.
//!
//! Syncs for the same principal are not serialized here. Two concurrent
//! syncs for one principal race in the store and the later commit wins;
//! callers that need per-principal ordering must provide it.

use indexmap::IndexSet;
use rbac_core::{AssignmentStore, AssignmentTransaction, ItemName, PrincipalId, StoreResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::errors::{AuthorizationError, Result, TransactionError};

/// Delta applied by a sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Items granted, in desired order
    pub added: Vec<ItemName>,
    /// Items revoked, in stored order
    pub removed: Vec<ItemName>,
}

impl SyncOutcome {
    /// Whether the stored set already matched
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Replaces a principal's direct assignments with a desired set
pub struct AssignmentReconciler<S> {
    store: Arc<S>,
}

impl<S> Clone for AssignmentReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AssignmentStore> AssignmentReconciler<S> {
    /// Create a reconciler over `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Make `principal`'s direct assignments exactly `desired`
    ///
    /// Duplicates in `desired` are ignored.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::Store`] if reading the current set fails, or a
    ///   write step fails and the rollback succeeds
    /// - [`AuthorizationError::Transaction`] if the transaction cannot begin
    ///   or commit, or a write step and its rollback both fail
    #[tracing::instrument(level = "debug", skip(self, desired), fields(desired = desired.len()))]
    pub async fn sync(&self, principal: &PrincipalId, desired: &[ItemName]) -> Result<SyncOutcome> {
        let current: IndexSet<ItemName> = self
            .store
            .assigned_items(principal, None)
            .await?
            .into_iter()
            .map(|item| item.name)
            .collect();
        let desired: IndexSet<&ItemName> = desired.iter().collect();

        let outcome = SyncOutcome {
            added: desired
                .iter()
                .filter(|item| !current.contains(**item))
                .map(|item| (*item).clone())
                .collect(),
            removed: current
                .iter()
                .filter(|item| !desired.contains(item))
                .cloned()
                .collect(),
        };

        if outcome.is_noop() {
            debug!("Assignments already in sync");
            return Ok(outcome);
        }

        let mut tx = self.store.begin().await.map_err(TransactionError::Begin)?;

        let applied = apply(tx.as_mut(), principal, &outcome).await;
        if let Err(cause) = applied {
            return Err(match tx.rollback().await {
                Ok(()) => {
                    warn!(error = %cause, "Assignment sync rolled back");
                    AuthorizationError::Store(cause)
                }
                Err(rollback) => {
                    error!(
                        error = %cause,
                        rollback_error = %rollback,
                        "Assignment sync rollback failed"
                    );
                    TransactionError::RollbackFailed { cause, rollback }.into()
                }
            });
        }

        tx.commit().await.map_err(TransactionError::Commit)?;

        info!(
            principal = %principal,
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "Synchronized assignments"
        );
        Ok(outcome)
    }
}

async fn apply(
    tx: &mut dyn AssignmentTransaction,
    principal: &PrincipalId,
    outcome: &SyncOutcome,
) -> StoreResult<()> {
    if !outcome.removed.is_empty() {
        tx.revoke_all(principal, &outcome.removed).await?;
    }
    if !outcome.added.is_empty() {
        tx.assign_all(principal, &outcome.added).await?;
    }
    Ok(())
}
