// Item and hierarchy management commands

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rbac_core::{HierarchyStore, Item, ItemKind, ItemName, RuleName};
use rbac_store::MemoryItemStore;
use tracing::info;

use super::CommandOutput;

pub(crate) async fn children(store: &MemoryItemStore, item: String) -> Result<CommandOutput> {
    let item = ItemName::new(item);
    let children = store.children(&item).await?;
    Ok(CommandOutput::lines(
        children
            .into_iter()
            .map(|child| format!("{} ({})", child.name, child.kind)),
    ))
}

pub(crate) async fn add_item(
    store: &MemoryItemStore,
    name: String,
    kind: ItemKind,
    description: Option<String>,
    rule: Option<String>,
) -> Result<CommandOutput> {
    let mut item = Item::new(kind, name, Utc::now());
    if let Some(description) = description {
        item = item.with_description(description);
    }
    if let Some(rule) = rule {
        item = item.with_rule(RuleName::new(rule));
    }

    let name = item.name.clone();
    store
        .insert_item(item)
        .await
        .with_context(|| format!("Failed to add item {name}"))?;

    info!(item = %name, %kind, "Added item");
    Ok(CommandOutput::line(format!("added {kind} {name}")))
}

pub(crate) async fn delete_item(store: &MemoryItemStore, name: String) -> Result<CommandOutput> {
    let name = ItemName::new(name);
    if !store.delete_item(&name).await? {
        bail!("Unknown item: {name}");
    }

    info!(item = %name, "Deleted item");
    Ok(CommandOutput::line(format!("deleted {name}")))
}

pub(crate) async fn add_child(
    store: &MemoryItemStore,
    parent: String,
    child: String,
) -> Result<CommandOutput> {
    let parent = ItemName::new(parent);
    let child = ItemName::new(child);

    store
        .add_child(&parent, &child)
        .await
        .with_context(|| format!("Failed to link {child} under {parent}"))?;
    Ok(CommandOutput::line(format!("linked {child} under {parent}")))
}

pub(crate) async fn remove_child(
    store: &MemoryItemStore,
    parent: String,
    child: String,
) -> Result<CommandOutput> {
    let parent = ItemName::new(parent);
    let child = ItemName::new(child);

    store.remove_child(&parent, &child).await?;
    Ok(CommandOutput::line(format!("unlinked {child} from {parent}")))
}
