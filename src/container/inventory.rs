use super::record::ContainerRecord;
use crate::error::CorralError;
use crate::storage::StorageClient;

/// Every persisted container row. No filtering, no pagination.
pub async fn list(storage: &dyn StorageClient) -> Result<Vec<ContainerRecord>, CorralError> {
    Ok(storage.select_all().await?)
}
