use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::params;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_rusqlite::Connection;

use super::{StorageClient, StorageTransaction};
use crate::config::StorageConfig;
use crate::container::ContainerRecord;
use crate::error::StorageError;

const CREATE_CONTAINERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS containers (
        id TEXT PRIMARY KEY NOT NULL,
        image TEXT NOT NULL,
        image_id TEXT NOT NULL,
        name TEXT,
        command TEXT NOT NULL,
        created INTEGER NOT NULL,
        state TEXT NOT NULL,
        status TEXT NOT NULL
    )";

const UPSERT_CONTAINER: &str = "
    INSERT INTO containers (id, image, image_id, name, command, created, state, status)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
        image = excluded.image,
        image_id = excluded.image_id,
        name = excluded.name,
        command = excluded.command,
        created = excluded.created,
        state = excluded.state,
        status = excluded.status";

const SELECT_CONTAINERS: &str = "
    SELECT id, image, image_id, name, command, created, state, status
    FROM containers
    ORDER BY id";

/// SQLite-backed container inventory.
///
/// All statements run on one connection. An open transaction holds `gate`
/// until it commits or rolls back, and readers take the same gate, so a
/// reader never sees a batch that is only partially written.
pub struct SqliteStore {
    conn: Connection,
    gate: Arc<Mutex<()>>,
}

impl SqliteStore {
    pub async fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::open_path(&config.path, Duration::from_millis(config.busy_timeout)).await
    }

    pub async fn open_path(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        let conn = Connection::open(path).await?;

        conn.call(move |conn: &mut rusqlite::Connection| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(busy_timeout)?;
            Ok(())
        })
        .await?;

        log::debug!("Opened inventory database at {:?}", path);
        Ok(Self::from_connection(conn))
    }

    /// Store with no backing file; contents vanish with the value.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().await?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Creates the `containers` table if it does not exist yet.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        self.conn
            .call(|conn: &mut rusqlite::Connection| {
                conn.execute_batch(CREATE_CONTAINERS_TABLE)?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageClient for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let guard = Arc::clone(&self.gate).lock_owned().await;

        // Owns the gate before BEGIN is sent, so a cancelled `begin` still
        // rolls back through `Drop`.
        let tx = SqliteTransaction {
            conn: self.conn.clone(),
            guard: Some(guard),
        };

        tx.conn
            .call(|conn: &mut rusqlite::Connection| {
                conn.execute_batch("BEGIN IMMEDIATE")?;
                Ok(())
            })
            .await?;

        Ok(Box::new(tx))
    }

    async fn select_all(&self) -> Result<Vec<ContainerRecord>, StorageError> {
        let _guard = self.gate.lock().await;

        let rows = self
            .conn
            .call(|conn: &mut rusqlite::Connection| {
                let mut stmt = conn.prepare(SELECT_CONTAINERS)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(ContainerRecord {
                            id: row.get(0)?,
                            image: row.get(1)?,
                            image_id: row.get(2)?,
                            name: row.get(3)?,
                            command: row.get(4)?,
                            created: row.get(5)?,
                            state: row.get(6)?,
                            status: row.get(7)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows)
    }
}

struct SqliteTransaction {
    conn: Connection,
    // `None` once the transaction has been committed or rolled back.
    guard: Option<OwnedMutexGuard<()>>,
}

impl SqliteTransaction {
    async fn finish(mut self: Box<Self>, statement: &'static str) -> Result<(), StorageError> {
        let result = self
            .conn
            .call(move |conn: &mut rusqlite::Connection| {
                if let Err(e) = conn.execute_batch(statement) {
                    // A failed COMMIT leaves the transaction open.
                    if !conn.is_autocommit() {
                        let _ = conn.execute_batch("ROLLBACK");
                    }
                    return Err(e.into());
                }
                Ok(())
            })
            .await;

        self.guard.take();
        result.map_err(StorageError::from)
    }
}

#[async_trait]
impl StorageTransaction for SqliteTransaction {
    async fn upsert(&mut self, record: &ContainerRecord) -> Result<(), StorageError> {
        let record = record.clone();

        self.conn
            .call(move |conn: &mut rusqlite::Connection| {
                conn.execute(
                    UPSERT_CONTAINER,
                    params![
                        record.id,
                        record.image,
                        record.image_id,
                        record.name,
                        record.command,
                        record.created,
                        record.state,
                        record.status,
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        log::warn!("Inventory transaction dropped before it finished, rolling back");
        let conn = self.conn.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = conn
                        .call(|conn: &mut rusqlite::Connection| {
                            // BEGIN may have failed or never reached the worker.
                            if !conn.is_autocommit() {
                                conn.execute_batch("ROLLBACK")?;
                            }
                            Ok(())
                        })
                        .await;
                    if let Err(e) = result {
                        log::error!("Failed to roll back dropped transaction: {}", e);
                    }
                    drop(guard);
                });
            }
            Err(_) => log::error!("No tokio runtime to roll back dropped transaction"),
        }
    }
}
