//! Authorization errors
//!
//! Store failures pass through unchanged. Hierarchy anomalies (depth breach,
//! cycle) are their own variants so callers never mistake them for a denial.

use rbac_core::{ItemName, RuleName, StoreError};

use crate::rules::RuleError;

/// Errors returned by the authorization components
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// The item store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The hierarchy walk needed to go deeper than the configured cap
    #[error(
        "Recursion limit exceeded: {item} has children more than {max_depth} levels below an assigned item"
    )]
    RecursionLimitExceeded {
        /// Item being checked, if the walk was an access check
        target: Option<ItemName>,
        /// Item whose children lie beyond the cap
        item: ItemName,
        /// Configured cap
        max_depth: usize,
    },

    /// The hierarchy reachable from the principal contains a cycle
    #[error("Hierarchy cycle detected: {}", display_path(.path))]
    HierarchyCycle {
        /// Items along the cycle; the first and last entries are equal
        path: Vec<ItemName>,
    },

    /// An assignment transaction failed
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// An item carries a rule but no evaluator is installed
    #[error("Item {item} carries rule {rule} but no rule evaluator is installed")]
    RuleUnavailable {
        /// Rule attached to the item
        rule: RuleName,
        /// Item carrying the rule
        item: ItemName,
    },

    /// A rule evaluator failed
    #[error("Rule {rule} failed: {source}")]
    Rule {
        /// Rule being evaluated
        rule: RuleName,
        /// Evaluator error
        source: RuleError,
    },
}

impl AuthorizationError {
    /// Whether the error reports a malformed hierarchy rather than a failure
    pub fn is_hierarchy_anomaly(&self) -> bool {
        matches!(
            self,
            Self::RecursionLimitExceeded { .. } | Self::HierarchyCycle { .. }
        )
    }
}

/// Failure of the reconciler's transaction
///
/// A failed write step that rolled back cleanly is reported as
/// [`AuthorizationError::Store`] instead: nothing was applied.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction could not be opened
    #[error("Failed to begin assignment transaction: {0}")]
    Begin(#[source] StoreError),

    /// The commit failed; the store applied nothing
    #[error("Failed to commit assignment transaction: {0}")]
    Commit(#[source] StoreError),

    /// A write step failed and so did the rollback
    #[error("{cause}; rollback failed: {rollback}")]
    RollbackFailed {
        /// Failure that triggered the rollback
        #[source]
        cause: StoreError,
        /// Failure of the rollback itself
        rollback: StoreError,
    },
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthorizationError>;

fn display_path(path: &[ItemName]) -> String {
    path.iter()
        .map(ItemName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
