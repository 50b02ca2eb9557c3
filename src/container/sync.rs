use std::collections::HashMap;

use super::snapshot::snapshot;
use crate::error::CorralError;
use crate::runtime::RuntimeClient;
use crate::storage::StorageClient;

/// Writes the currently listed containers into storage in one transaction
/// and returns the number of rows written.
///
/// Either every record lands or none do. Ids are stored under their
/// truncated prefix; two containers sharing a prefix overwrite each other
/// and the later one in the snapshot wins.
pub async fn sync(
    runtime: &dyn RuntimeClient,
    storage: &dyn StorageClient,
) -> Result<usize, CorralError> {
    let containers = snapshot(runtime, false).await?;

    let mut seen: HashMap<String, String> = HashMap::with_capacity(containers.len());
    let mut tx = storage.begin().await?;

    for container in &containers {
        let row = container.truncated();
        if let Some(previous) = seen.insert(row.id.clone(), container.id.clone()) {
            log::warn!(
                "Containers {} and {} share the stored id {}",
                previous,
                container.id,
                row.id
            );
        }

        if let Err(e) = tx.upsert(&row).await {
            log::error!("Failed to write container {}: {}", row.id, e);
            if let Err(rollback_err) = tx.rollback().await {
                log::error!("Failed to roll back inventory sync: {}", rollback_err);
            }
            return Err(e.into());
        }
    }

    tx.commit().await?;

    log::info!("Synchronized {} containers", containers.len());
    Ok(containers.len())
}
