//! Items, hierarchy edges and assignments
//!
//! Items are owned by the item store. The authorization layer only reads
//! them, so every type here is a plain value with no behaviour beyond
//! construction and conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Unique name of an item in the permission hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Create an item name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ItemName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ItemName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a user or service that can be granted items
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a principal identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PrincipalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Name of a conditional-grant rule attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleName(String);

impl RuleName {
    /// Create a rule name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Level of an item in the hierarchy
///
/// Filters that accept "any kind" take `Option<ItemKind>` with `None` meaning
/// no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Top-level grouping handed to principals
    Role,
    /// Mid-level bundle of operations
    Task,
    /// Leaf permission checked by applications
    Operation,
}

impl ItemKind {
    /// Lowercase label used in snapshots, configuration and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Role => "role",
            ItemKind::Task => "task",
            ItemKind::Operation => "operation",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown item kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item kind '{0}' (expected role, task or operation)")]
pub struct ParseItemKindError(String);

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" => Ok(ItemKind::Role),
            "task" => Ok(ItemKind::Task),
            "operation" | "op" => Ok(ItemKind::Operation),
            other => Err(ParseItemKindError(other.to_string())),
        }
    }
}

/// A node in the permission hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique name, the identity key
    pub name: ItemName,
    /// Hierarchy level
    pub kind: ItemKind,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Rule that must admit the item before it grants or is traversed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleName>,
    /// Creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last update time, if the item was ever updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Create an item with no description and no rule
    pub fn new(kind: ItemKind, name: impl Into<ItemName>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            rule: None,
            created_at,
            updated_at: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a rule
    pub fn with_rule(mut self, rule: impl Into<RuleName>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Whether the item passes an optional kind filter
    pub fn matches_kind(&self, kind: Option<ItemKind>) -> bool {
        kind.map_or(true, |kind| self.kind == kind)
    }
}

/// Directed parent → child link between two items
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyEdge {
    /// Item that contains the child
    pub parent: ItemName,
    /// Item implied by the parent
    pub child: ItemName,
}

impl HierarchyEdge {
    /// Create an edge
    pub fn new(parent: impl Into<ItemName>, child: impl Into<ItemName>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// Whether the edge points an item at itself
    pub fn is_self_reference(&self) -> bool {
        self.parent == self.child
    }
}

/// Direct grant of one item to one principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Granted item
    pub item: ItemName,
    /// Receiving principal
    pub principal: PrincipalId,
    /// When the grant was recorded
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
