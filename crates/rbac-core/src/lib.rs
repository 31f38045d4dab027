//! RBAC Core - shared model for hierarchical access control
//!
//! This crate defines the vocabulary every other RBAC crate speaks. It holds
//! no resolution logic of its own.
//!
//! # Contents
//!
//! - `types`: items, hierarchy edges, assignments and their identifiers
//! - `store`: the read/write surface the authorization layer needs from an
//!   item store (`HierarchyStore`, `AssignmentStore`, `AssignmentTransaction`)
//! - `errors`: `StoreError`, the single failure type of that surface
//! - `config`: `RbacConfig`, loaded from TOML and overridden from the
//!   environment
//!
//! # Hierarchy
//!
//! ```text
//! Role ("admin")
//!   └── Task ("manage-users")
//!         ├── Operation ("create-user")
//!         └── Operation ("delete-user")
//! ```
//!
//! A principal assigned to `admin` holds every node below it. Edges are
//! directed parent → child and are intended to be acyclic; the store does not
//! verify that.

#![forbid(unsafe_code)]

/// Items, edges, assignments and identifiers
pub mod types;

/// Store interfaces consumed by the authorization layer
pub mod store;

/// Unified store error
pub mod errors;

/// Configuration loading and validation
pub mod config;

pub use config::{ConfigError, DepthLimit, LoggingConfig, RbacConfig, ResolverConfig, DEFAULT_MAX_DEPTH};
pub use errors::{StoreError, StoreResult};
pub use store::{AssignmentRow, AssignmentStore, AssignmentTransaction, HierarchyStore};
pub use types::{
    Assignment, HierarchyEdge, Item, ItemKind, ItemName, ParseItemKindError, PrincipalId,
    RuleName,
};
