//! RBAC Authorization
//!
//! Access decisions over an item hierarchy. Three components share one
//! store and are otherwise independent:
//!
//! - [`HierarchyResolver`] answers "does principal P hold item X" by walking
//!   the children of P's direct assignments, bounded by a depth cap and
//!   guarded against cycles.
//! - [`AssignmentQuery`] lists direct assignments for one principal, or for
//!   many principals in a single store read.
//! - [`AssignmentReconciler`] replaces a principal's direct assignments with
//!   a desired set by applying the minimal add/remove delta atomically.
//!
//! [`AccessControl`] bundles the three over one store for callers that want
//! a single handle.
//!
//! Each component receives its store at construction; there is no global
//! state.

#![forbid(unsafe_code)]

mod access_control;
mod errors;
mod query;
mod reconcile;
mod resolver;
mod rules;

pub use access_control::AccessControl;
pub use errors::{AuthorizationError, Result, TransactionError};
pub use query::{AssignmentQuery, BatchAssignments};
pub use reconcile::{AssignmentReconciler, SyncOutcome};
pub use resolver::HierarchyResolver;
pub use rules::{RuleError, RuleEvaluator};
