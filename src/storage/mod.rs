//! Inventory storage capability.
//!
//! Writes only happen through a [`StorageTransaction`]; reads are
//! non-transactional and see only committed rows.

pub mod sqlite;

use async_trait::async_trait;

use crate::container::ContainerRecord;
use crate::error::StorageError;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError>;

    /// Every persisted row, ordered by id.
    async fn select_all(&self) -> Result<Vec<ContainerRecord>, StorageError>;
}

#[async_trait]
pub trait StorageTransaction: Send {
    /// Inserts the record, or overwrites every column if a row with the
    /// same id already exists.
    async fn upsert(&mut self, record: &ContainerRecord) -> Result<(), StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}
