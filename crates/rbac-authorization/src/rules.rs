//! Conditional grants
//!
//! An item may name a rule. When it does, the resolver asks the installed
//! [`RuleEvaluator`] before the item grants access or is walked through.
//! Rule semantics belong to the evaluator; this crate only names them.

use async_trait::async_trait;
use rbac_core::{Item, PrincipalId, RuleName};

/// Failure reported by a rule evaluator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    /// Create a rule error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Decides whether a rule admits an item for a principal
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    /// Return whether `rule`, attached to `item`, admits `principal`
    async fn evaluate(
        &self,
        rule: &RuleName,
        principal: &PrincipalId,
        item: &Item,
    ) -> Result<bool, RuleError>;
}
