use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use tokio::sync::Mutex;

use crate::container::{Action, ContainerRecord, Outcome, inventory, lifecycle, sync};
use crate::error::CorralError;
use crate::runtime::RuntimeClient;
use crate::storage::StorageClient;

/// The four operations exposed to the HTTP layer.
///
/// Holds the runtime and storage handles; nothing else is shared between
/// requests.
pub struct ControlPlane {
    runtime: Arc<dyn RuntimeClient>,
    storage: Arc<dyn StorageClient>,
    name_locks: Option<NameLocks>,
}

impl ControlPlane {
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        storage: Arc<dyn StorageClient>,
        serialize_per_name: bool,
    ) -> Self {
        Self {
            runtime,
            storage,
            name_locks: serialize_per_name.then(NameLocks::default),
        }
    }

    pub async fn list_inventory(&self) -> Result<Vec<ContainerRecord>, CorralError> {
        inventory::list(self.storage.as_ref()).await
    }

    pub async fn sync_inventory(&self) -> Result<usize, CorralError> {
        sync::sync(self.runtime.as_ref(), self.storage.as_ref()).await
    }

    pub async fn start_by_name(&self, name: &str) -> Result<Outcome, CorralError> {
        self.apply(name, Action::Start).await
    }

    pub async fn stop_by_name(&self, name: &str) -> Result<Outcome, CorralError> {
        self.apply(name, Action::Stop).await
    }

    async fn apply(&self, name: &str, action: Action) -> Result<Outcome, CorralError> {
        let Some(locks) = &self.name_locks else {
            return lifecycle::apply(self.runtime.as_ref(), name, action).await;
        };

        let lease = locks.lease(name);
        let _guard = lease.lock.lock().await;
        lifecycle::apply(self.runtime.as_ref(), name, action).await
    }
}

/// One mutex per container name with a request in flight.
///
/// An entry lives only while some [`NameLease`] refers to it.
#[derive(Default)]
struct NameLocks {
    inner: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    fn lease(&self, name: &str) -> NameLease<'_> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(inner.entry(name.to_string()).or_default());
        NameLease {
            locks: self,
            name: name.to_string(),
            lock,
        }
    }
}

struct NameLease<'a> {
    locks: &'a NameLocks,
    name: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for NameLease<'_> {
    fn drop(&mut self) {
        let mut inner = self
            .locks
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The map's own reference plus ours: nobody else is waiting.
        if inner
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 2)
        {
            inner.remove(&self.name);
        }
    }
}
