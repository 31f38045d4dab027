//! RBAC Store
//!
//! In-memory implementation of the `rbac-core` store interfaces, plus the
//! item and edge management that the authorization layer treats as
//! external: creating and deleting items, linking and unlinking children,
//! and moving the whole state in and out of a serializable snapshot.
//!
//! The store is cheap to clone; clones share the same state.

#![forbid(unsafe_code)]

/// Shared state and the store handle
pub mod memory;

/// Staged assignment transactions
pub mod transaction;

/// Serializable whole-store snapshots
pub mod snapshot;

pub use memory::MemoryItemStore;
pub use snapshot::StoreSnapshot;
pub use transaction::MemoryTransaction;
