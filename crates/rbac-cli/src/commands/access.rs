// Access checks and assignment commands

use anyhow::{Context, Result};
use rbac_authorization::AccessControl;
use rbac_core::{ItemKind, ItemName, PrincipalId};
use rbac_store::MemoryItemStore;
use tracing::info;

use super::CommandOutput;

type Access = AccessControl<MemoryItemStore>;

fn join(items: &[ItemName]) -> String {
    items
        .iter()
        .map(ItemName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) async fn check(access: &Access, principal: String, item: String) -> Result<CommandOutput> {
    let principal = PrincipalId::new(principal);
    let item = ItemName::new(item);

    let allowed = access
        .has_access(&principal, &item)
        .await
        .with_context(|| format!("Access check for {principal} on {item} failed"))?;

    info!(%principal, %item, allowed, "Checked access");
    Ok(CommandOutput::line(if allowed { "allowed" } else { "denied" }))
}

pub(crate) async fn accessible(access: &Access, principal: String) -> Result<CommandOutput> {
    let principal = PrincipalId::new(principal);
    let items = access
        .accessible_items(&principal)
        .await
        .with_context(|| format!("Failed to resolve items held by {principal}"))?;

    Ok(CommandOutput::lines(items.iter().map(ToString::to_string)))
}

pub(crate) async fn query(
    access: &Access,
    principal: String,
    kind: Option<ItemKind>,
) -> Result<CommandOutput> {
    let principal = PrincipalId::new(principal);
    let items = access.query(kind, &principal).await?;
    Ok(CommandOutput::lines(items.iter().map(ToString::to_string)))
}

pub(crate) async fn batch_query(
    access: &Access,
    principals: Vec<String>,
    kind: Option<ItemKind>,
) -> Result<CommandOutput> {
    let principals: Vec<PrincipalId> = principals.into_iter().map(PrincipalId::new).collect();
    let batch = access.batch_query(kind, &principals).await?;

    Ok(CommandOutput::lines(
        batch
            .iter()
            .map(|(principal, items)| format!("{principal}: {}", join(items))),
    ))
}

pub(crate) async fn assign(access: &Access, item: String, principal: String) -> Result<CommandOutput> {
    let item = ItemName::new(item);
    let principal = PrincipalId::new(principal);

    access
        .assign(&item, &principal)
        .await
        .with_context(|| format!("Failed to assign {item} to {principal}"))?;
    Ok(CommandOutput::line(format!("assigned {item} to {principal}")))
}

pub(crate) async fn revoke(access: &Access, item: String, principal: String) -> Result<CommandOutput> {
    let item = ItemName::new(item);
    let principal = PrincipalId::new(principal);

    access
        .revoke(&item, &principal)
        .await
        .with_context(|| format!("Failed to revoke {item} from {principal}"))?;
    Ok(CommandOutput::line(format!("revoked {item} from {principal}")))
}

pub(crate) async fn sync(
    access: &Access,
    principal: String,
    items: Vec<String>,
) -> Result<CommandOutput> {
    let principal = PrincipalId::new(principal);
    let desired: Vec<ItemName> = items.into_iter().map(ItemName::new).collect();

    let outcome = access
        .sync(&principal, &desired)
        .await
        .with_context(|| format!("Failed to sync assignments of {principal}"))?;

    if outcome.is_noop() {
        return Ok(CommandOutput::line("unchanged"));
    }
    Ok(CommandOutput::lines([
        format!("added: {}", join(&outcome.added)),
        format!("removed: {}", join(&outcome.removed)),
    ]))
}
