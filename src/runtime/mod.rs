//! Container runtime capability.
//!
//! The reconciliation core only ever needs three things from the daemon:
//! list containers, start one by id and stop one by id. Everything goes
//! through [`RuntimeClient`] so the core can be exercised against a fake.

pub mod docker;

use async_trait::async_trait;

use crate::error::RuntimeError;

/// A container exactly as listed by the daemon, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeContainer {
    pub id: String,
    pub image: String,
    pub image_id: String,
    pub names: Vec<String>,
    pub command: String,
    pub created: i64,
    pub state: String,
    pub status: String,
}

#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Lists containers. Stopped containers are only included when
    /// `include_stopped` is set.
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<RuntimeContainer>, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;
}
