//! CLI commands
//!
//! Every command loads the store file, runs against an
//! [`AccessControl`](rbac_authorization::AccessControl) handle and writes the
//! store back only if the command changed it.

mod access;
mod items;

use anyhow::Result;
use clap::Subcommand;
use rbac_authorization::AccessControl;
use rbac_core::{ItemKind, RbacConfig};
use std::path::Path;
use std::sync::Arc;

use crate::store_file::{load_store, save_store};

/// `rbac` subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether a principal holds an item, directly or inherited
    Check {
        /// Principal to check
        principal: String,
        /// Item to check for
        item: String,
    },

    /// List every item a principal holds, directly or inherited
    Accessible {
        /// Principal to inspect
        principal: String,
    },

    /// List a principal's direct assignments
    Query {
        /// Principal to inspect
        principal: String,
        /// Only list items of this kind (role, task, operation)
        #[arg(short, long)]
        kind: Option<ItemKind>,
    },

    /// List direct assignments for several principals at once
    BatchQuery {
        /// Principals to inspect, in output order
        #[arg(required = true)]
        principals: Vec<String>,
        /// Only list items of this kind (role, task, operation)
        #[arg(short, long)]
        kind: Option<ItemKind>,
    },

    /// List the direct children of an item
    Children {
        /// Parent item
        item: String,
    },

    /// Create an item
    AddItem {
        /// Unique item name
        name: String,
        /// Item kind (role, task, operation)
        #[arg(short, long)]
        kind: ItemKind,
        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
        /// Rule that must admit the item
        ///
        /// This tool installs no rule evaluator: the item never grants, and
        /// checks that are not satisfied without it fail with an error.
        #[arg(long)]
        rule: Option<String>,
    },

    /// Delete an item with its edges and assignments
    DeleteItem {
        /// Item to delete
        name: String,
    },

    /// Link a child item under a parent
    AddChild {
        /// Parent item
        parent: String,
        /// Child item
        child: String,
    },

    /// Remove the link between a parent and a child
    RemoveChild {
        /// Parent item
        parent: String,
        /// Child item
        child: String,
    },

    /// Grant an item directly to a principal
    Assign {
        /// Item to grant
        item: String,
        /// Receiving principal
        principal: String,
    },

    /// Remove a direct grant
    Revoke {
        /// Item to revoke
        item: String,
        /// Principal losing the grant
        principal: String,
    },

    /// Replace a principal's direct assignments with the given items
    Sync {
        /// Principal to reconcile
        principal: String,
        /// Desired items; none revokes everything
        items: Vec<String>,
    },
}

impl Command {
    fn writes(&self) -> bool {
        !matches!(
            self,
            Self::Check { .. }
                | Self::Accessible { .. }
                | Self::Query { .. }
                | Self::BatchQuery { .. }
                | Self::Children { .. }
        )
    }
}

/// Printable result of a command
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Lines for standard output
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub(crate) fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }

    pub(crate) fn lines(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }
}

/// Run `command` against the store file at `store_path`
pub async fn execute(
    command: Command,
    store_path: &Path,
    config: &RbacConfig,
) -> Result<CommandOutput> {
    let store = Arc::new(load_store(store_path).await?);
    let control = AccessControl::new(Arc::clone(&store), config);
    let writes = command.writes();

    let output = match command {
        Command::Check { principal, item } => access::check(&control, principal, item).await?,
        Command::Accessible { principal } => access::accessible(&control, principal).await?,
        Command::Query { principal, kind } => access::query(&control, principal, kind).await?,
        Command::BatchQuery { principals, kind } => {
            access::batch_query(&control, principals, kind).await?
        }
        Command::Children { item } => items::children(&store, item).await?,
        Command::AddItem {
            name,
            kind,
            description,
            rule,
        } => items::add_item(&store, name, kind, description, rule).await?,
        Command::DeleteItem { name } => items::delete_item(&store, name).await?,
        Command::AddChild { parent, child } => items::add_child(&store, parent, child).await?,
        Command::RemoveChild { parent, child } => {
            items::remove_child(&store, parent, child).await?
        }
        Command::Assign { item, principal } => access::assign(&control, item, principal).await?,
        Command::Revoke { item, principal } => access::revoke(&control, item, principal).await?,
        Command::Sync { principal, items } => access::sync(&control, principal, items).await?,
    };

    if writes {
        save_store(&store, store_path).await?;
    }
    Ok(output)
}
