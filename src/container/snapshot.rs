use super::record::{ContainerRecord, normalize_name};
use crate::error::CorralError;
use crate::runtime::{RuntimeClient, RuntimeContainer};

/// Reads the current container list from the runtime. The order is whatever
/// the daemon reports.
pub async fn snapshot(
    runtime: &dyn RuntimeClient,
    include_stopped: bool,
) -> Result<Vec<ContainerRecord>, CorralError> {
    let containers = runtime.list_containers(include_stopped).await?;
    Ok(containers.into_iter().map(ContainerRecord::from).collect())
}

impl From<RuntimeContainer> for ContainerRecord {
    fn from(container: RuntimeContainer) -> Self {
        let name = container
            .names
            .first()
            .map(|raw| normalize_name(raw).to_string());

        ContainerRecord {
            id: container.id,
            image: container.image,
            image_id: container.image_id,
            name,
            command: container.command,
            created: container.created,
            state: container.state,
            status: container.status,
        }
    }
}
