//! In-process fakes for the runtime and storage capabilities.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::container::ContainerRecord;
use crate::container::status::{LifecyclePhase, classify};
use crate::error::{RuntimeError, StorageError};
use crate::runtime::{RuntimeClient, RuntimeContainer};
use crate::storage::{StorageClient, StorageTransaction};

pub fn runtime_container(id: &str, name: &str, status: &str) -> RuntimeContainer {
    let state = match classify(status) {
        LifecyclePhase::Running => "running",
        LifecyclePhase::Exited => "exited",
        LifecyclePhase::Other => "created",
    };
    RuntimeContainer {
        id: id.to_string(),
        image: format!("registry.local/{}:latest", name.trim_start_matches('/')),
        image_id: format!("sha256:{id}"),
        names: vec![name.to_string()],
        command: "/docker-entrypoint.sh".to_string(),
        created: 1_700_000_000,
        state: state.to_string(),
        status: status.to_string(),
    }
}

fn daemon_error(status_code: u16, message: &str) -> RuntimeError {
    bollard::errors::Error::DockerResponseServerError {
        status_code,
        message: message.to_string(),
    }
    .into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Start(String),
    Stop(String),
}

/// Behaves like a daemon: a non-`all` listing only returns running
/// containers, and start/stop flip the reported status.
#[derive(Default)]
pub struct FakeRuntime {
    containers: Mutex<Vec<RuntimeContainer>>,
    calls: Mutex<Vec<RuntimeCall>>,
    listings: Mutex<Vec<bool>>,
    fail_listing: AtomicBool,
    fail_mutations: AtomicBool,
}

impl FakeRuntime {
    pub fn new(containers: Vec<RuntimeContainer>) -> Self {
        Self {
            containers: Mutex::new(containers),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The `include_stopped` flag of every listing, in order.
    pub fn listings(&self) -> Vec<bool> {
        self.listings.lock().unwrap().clone()
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self) {
        self.fail_mutations.store(true, Ordering::SeqCst);
    }

    pub fn set_status(&self, id: &str, status: &str) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(container) = containers.iter_mut().find(|c| c.id == id) {
            container.status = status.to_string();
        }
    }

    fn mutate(&self, call: RuntimeCall) -> Result<(), RuntimeError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(daemon_error(500, "daemon refused the call"));
        }
        let (id, status, state) = match &call {
            RuntimeCall::Start(id) => (id.clone(), "Up Less than a second", "running"),
            RuntimeCall::Stop(id) => (id.clone(), "Exited (0) Less than a second ago", "exited"),
        };
        let mut containers = self.containers.lock().unwrap();
        let container = containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| daemon_error(404, &format!("No such container: {id}")))?;
        container.status = status.to_string();
        container.state = state.to_string();
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl RuntimeClient for FakeRuntime {
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<RuntimeContainer>, RuntimeError> {
        self.listings.lock().unwrap().push(include_stopped);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(daemon_error(503, "daemon unreachable"));
        }
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .filter(|c| include_stopped || classify(&c.status) == LifecyclePhase::Running)
            .cloned()
            .collect())
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.mutate(RuntimeCall::Start(id.to_string()))
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.mutate(RuntimeCall::Stop(id.to_string()))
    }
}

type Rows = Arc<Mutex<BTreeMap<String, ContainerRecord>>>;

/// Transactions stage writes on a copy of the committed rows and swap it in
/// on commit.
#[derive(Default)]
pub struct FakeStorage {
    rows: Rows,
    fail_upsert_at: Arc<Mutex<Option<usize>>>,
    fail_reads: AtomicBool,
    transactions: AtomicUsize,
    rollbacks: Arc<AtomicUsize>,
}

impl FakeStorage {
    pub fn rows(&self) -> Vec<ContainerRecord> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    /// The n-th upsert (1-based) of the next transaction fails.
    pub fn fail_upsert_at(&self, n: usize) {
        *self.fail_upsert_at.lock().unwrap() = Some(n);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let staged = self.rows.lock().unwrap().clone();
        Ok(Box::new(FakeTransaction {
            staged,
            rows: Arc::clone(&self.rows),
            fail_at: self.fail_upsert_at.lock().unwrap().take(),
            upserts: 0,
            rollbacks: Arc::clone(&self.rollbacks),
        }))
    }

    async fn select_all(&self) -> Result<Vec<ContainerRecord>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(tokio_rusqlite::Error::ConnectionClosed.into());
        }
        Ok(self.rows())
    }
}

struct FakeTransaction {
    staged: BTreeMap<String, ContainerRecord>,
    rows: Rows,
    fail_at: Option<usize>,
    upserts: usize,
    rollbacks: Arc<AtomicUsize>,
}

#[async_trait]
impl StorageTransaction for FakeTransaction {
    async fn upsert(&mut self, record: &ContainerRecord) -> Result<(), StorageError> {
        self.upserts += 1;
        if self.fail_at == Some(self.upserts) {
            return Err(tokio_rusqlite::Error::ConnectionClosed.into());
        }
        self.staged.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let this = *self;
        *this.rows.lock().unwrap() = this.staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
