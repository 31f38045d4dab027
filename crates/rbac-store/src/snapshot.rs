//! Whole-store snapshots
//!
//! A snapshot is the persisted shape of the store: an items table keyed by
//! name, a parent/child edge table and an assignments table. It serializes
//! to TOML as arrays of tables:
//!
//! ```toml
//! [[items]]
//! name = "checkrole"
//! kind = "role"
//!
//! [[edges]]
//! parent = "checkrole"
//! child = "checktask"
//!
//! [[assignments]]
//! item = "checkrole"
//! principal = "u"
//! ```

use rbac_core::{Assignment, HierarchyEdge, Item};
use serde::{Deserialize, Serialize};

/// Serializable contents of an item store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// Every item, in insertion order
    pub items: Vec<Item>,
    /// Every parent → child edge
    pub edges: Vec<HierarchyEdge>,
    /// Every direct assignment
    pub assignments: Vec<Assignment>,
}

impl StoreSnapshot {
    /// Whether the snapshot holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
