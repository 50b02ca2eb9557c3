//! Docker runtime client using bollard.
//!
//! The client is built once in `main` and handed to the control plane. It
//! connects using the default connection method (Unix socket on Linux/macOS,
//! named pipe on Windows).

use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{
    ListContainersOptions, ListContainersOptionsBuilder, StartContainerOptions,
    StartContainerOptionsBuilder, StopContainerOptions, StopContainerOptionsBuilder,
};

use super::{RuntimeClient, RuntimeContainer};
use crate::config::DockerConfig;
use crate::error::RuntimeError;

pub struct DockerRuntime {
    docker: Docker,
    stop_timeout: i32,
}

impl DockerRuntime {
    pub fn connect(config: &DockerConfig) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()?
            .with_timeout(Duration::from_secs(config.timeout));
        Ok(Self {
            docker,
            stop_timeout: config.stop_timeout,
        })
    }

    /// Pings the daemon so startup fails fast when it is unreachable.
    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await?;
        Ok(())
    }
}

impl From<ContainerSummary> for RuntimeContainer {
    fn from(summary: ContainerSummary) -> Self {
        RuntimeContainer {
            id: summary.id.unwrap_or_default(),
            image: summary.image.unwrap_or_default(),
            image_id: summary.image_id.unwrap_or_default(),
            names: summary.names.unwrap_or_default(),
            command: summary.command.unwrap_or_default(),
            created: summary.created.unwrap_or_default(),
            state: summary.state.map(|s| s.to_string()).unwrap_or_default(),
            status: summary.status.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<RuntimeContainer>, RuntimeError> {
        let options: ListContainersOptions =
            ListContainersOptionsBuilder::new().all(include_stopped).build();

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .inspect_err(|e| log::error!("Failed to list containers: {}", e))?;

        log::debug!("Docker reported {} containers", containers.len());
        Ok(containers.into_iter().map(RuntimeContainer::from).collect())
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        let options: StartContainerOptions = StartContainerOptionsBuilder::new().build();

        self.docker
            .start_container(id, Some(options))
            .await
            .inspect_err(|e| log::error!("Failed to start container {}: {}", id, e))?;

        Ok(())
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        let options: StopContainerOptions = StopContainerOptionsBuilder::new()
            .t(self.stop_timeout)
            .build();

        self.docker
            .stop_container(id, Some(options))
            .await
            .inspect_err(|e| log::error!("Failed to stop container {}: {}", id, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_conversion_fills_missing_fields() {
        let summary = ContainerSummary {
            id: Some("abcdef1234567".to_string()),
            names: Some(vec!["/web".to_string()]),
            image: Some("nginx".to_string()),
            status: Some("Up 2 days".to_string()),
            ..Default::default()
        };

        let container = RuntimeContainer::from(summary);
        assert_eq!(container.id, "abcdef1234567");
        assert_eq!(container.names, vec!["/web".to_string()]);
        assert_eq!(container.image, "nginx");
        assert_eq!(container.image_id, "");
        assert_eq!(container.created, 0);
        assert_eq!(container.state, "");
        assert_eq!(container.status, "Up 2 days");
    }
}
