//! Snapshot file persistence

use anyhow::{Context, Result};
use rbac_store::{MemoryItemStore, StoreSnapshot};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Load the store persisted at `path`; a missing file is an empty store
pub async fn load_store(path: &Path) -> Result<MemoryItemStore> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Store file missing, starting empty");
        return Ok(MemoryItemStore::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file {}", path.display()))?;
    let snapshot: StoreSnapshot = toml::from_str(&content)
        .with_context(|| format!("Invalid store file {}", path.display()))?;

    MemoryItemStore::from_snapshot(snapshot)
        .await
        .with_context(|| format!("Inconsistent store file {}", path.display()))
}

/// Write the whole store to `path`, replacing any previous file atomically
pub async fn save_store(store: &MemoryItemStore, path: &Path) -> Result<()> {
    let snapshot = store.snapshot().await;
    let content = toml::to_string_pretty(&snapshot).context("Failed to serialize store")?;

    // Replace in one rename so readers never see a partial file
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write store file {}", path.display()))?;
    temp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("Failed to replace store file {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        items = snapshot.items.len(),
        "Saved store file"
    );
    Ok(())
}
