//! Live backend handle registry.
//!
//! Explicitly constructed and injected into every component that needs it —
//! never a process-wide singleton — so tests can run against fake handles.
//! Registration happens at startup; afterwards the map is only read.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use emby_orchestrator_backend::{create_backend, BackendDescriptor, BackendError, MediaBackend};

struct RegisteredBackend {
    handle: Arc<dyn MediaBackend>,
    descriptor: BackendDescriptor,
}

/// Registry of live backend handles, keyed by backend id.
#[derive(Default)]
pub struct BackendRegistry {
    backends: RwLock<HashMap<String, RegisteredBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a handle for the descriptor and register it.
    ///
    /// Returns `false` — never an error — if the id is already present, the
    /// descriptor is disabled, or handle construction fails; each case is
    /// logged so one bad descriptor cannot block the others. Construction is
    /// purely local, no network round-trip happens here.
    pub async fn register(&self, descriptor: BackendDescriptor) -> bool {
        if !descriptor.enabled {
            log::warn!("[{}] Backend disabled, skipping registration", descriptor.id);
            return false;
        }
        match create_backend(&descriptor) {
            Ok(handle) => self.register_handle(descriptor, handle).await,
            Err(e) => {
                log::error!("[{}] Failed to construct backend handle: {e}", descriptor.id);
                false
            }
        }
    }

    /// Register a pre-built handle for the descriptor.
    ///
    /// Injection point for tests and alternative client implementations.
    /// Returns `false` if the id is already registered.
    pub async fn register_handle(
        &self,
        descriptor: BackendDescriptor,
        handle: Arc<dyn MediaBackend>,
    ) -> bool {
        let mut backends = self.backends.write().await;
        if backends.contains_key(&descriptor.id) {
            log::warn!("[{}] Backend already registered, skipping", descriptor.id);
            return false;
        }
        log::info!(
            "[{}] Registered backend '{}' at {}",
            descriptor.id,
            descriptor.name,
            descriptor.base_url
        );
        backends.insert(
            descriptor.id.clone(),
            RegisteredBackend { handle, descriptor },
        );
        true
    }

    /// Live handle for a backend id.
    pub async fn get(&self, id: &str) -> Option<Arc<dyn MediaBackend>> {
        self.backends.read().await.get(id).map(|b| b.handle.clone())
    }

    /// Descriptor for a backend id.
    pub async fn descriptor(&self, id: &str) -> Option<BackendDescriptor> {
        self.backends
            .read()
            .await
            .get(id)
            .map(|b| b.descriptor.clone())
    }

    /// Whether a backend is registered.
    pub async fn has(&self, id: &str) -> bool {
        self.backends.read().await.contains_key(id)
    }

    /// Ids of all registered backends.
    pub async fn list_ids(&self) -> Vec<String> {
        self.backends.read().await.keys().cloned().collect()
    }

    /// All registered (handle, descriptor) pairs.
    pub async fn entries(&self) -> Vec<(Arc<dyn MediaBackend>, BackendDescriptor)> {
        self.backends
            .read()
            .await
            .values()
            .map(|b| (b.handle.clone(), b.descriptor.clone()))
            .collect()
    }

    /// Number of registered backends.
    pub async fn len(&self) -> usize {
        self.backends.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.backends.read().await.is_empty()
    }

    /// Release every handle, collecting per-handle errors.
    ///
    /// One unhealthy backend cannot block shutdown of the rest: every close
    /// is attempted and failures are returned alongside being logged.
    pub async fn close_all(&self) -> Vec<(String, BackendError)> {
        let mut failures = Vec::new();
        let mut backends = self.backends.write().await;
        for (id, backend) in backends.drain() {
            match backend.handle.close().await {
                Ok(()) => log::info!("[{id}] Backend handle closed"),
                Err(e) => {
                    log::error!("[{id}] Failed to close backend handle: {e}");
                    failures.push((id, e));
                }
            }
        }
        failures
    }
}
