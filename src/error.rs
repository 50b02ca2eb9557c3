/// Failures talking to the container runtime daemon.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),
}

/// Failures talking to the inventory store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CorralError {
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(#[from] RuntimeError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Container {0} not found")]
    ContainerNotFound(String),
}

impl CorralError {
    /// Short machine readable name used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CorralError::RuntimeUnavailable(_) => "runtime_unavailable",
            CorralError::Storage(_) => "storage_error",
            CorralError::ContainerNotFound(_) => "container_not_found",
        }
    }
}
