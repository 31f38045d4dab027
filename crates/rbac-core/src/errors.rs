//! Store error type
//!
//! Every read or write against an item store fails with `StoreError`. The
//! authorization layer passes it through unmodified.

use crate::types::ItemName;

/// Failure of an item store operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store failed
    #[error("Store backend error: {message}")]
    Backend {
        /// Error message from the backend
        message: String,
    },

    /// An operation referenced an item that does not exist
    #[error("Unknown item: {name}")]
    UnknownItem {
        /// Name of the missing item
        name: ItemName,
    },

    /// An item with the same name already exists
    #[error("Duplicate item: {name}")]
    DuplicateItem {
        /// Conflicting name
        name: ItemName,
    },

    /// An item failed field validation
    #[error("Invalid item {field}: {message}")]
    InvalidItem {
        /// Field that failed validation
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// A hierarchy edge pointed an item at itself
    #[error("Item cannot be its own child: {name}")]
    SelfReference {
        /// Item named on both ends of the edge
        name: ItemName,
    },

    /// A failure injected by a test harness
    #[error("Injected failure during {operation}")]
    Injected {
        /// Store operation that was made to fail
        operation: String,
    },
}

impl StoreError {
    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an unknown item error
    pub fn unknown_item(name: impl Into<ItemName>) -> Self {
        Self::UnknownItem { name: name.into() }
    }

    /// Create a duplicate item error
    pub fn duplicate_item(name: impl Into<ItemName>) -> Self {
        Self::DuplicateItem { name: name.into() }
    }

    /// Create a field validation error
    pub fn invalid_item(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidItem {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an injected failure
    pub fn injected(operation: impl Into<String>) -> Self {
        Self::Injected {
            operation: operation.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
