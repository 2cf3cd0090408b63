//! Business logic service layer.

mod favorites;
mod health;
mod orchestrator;
mod redemption;

pub use favorites::{FavoritesSync, SyncSummary};
pub use health::HealthMonitor;
pub use orchestrator::AccountOrchestrator;
pub use redemption::RedemptionService;

use std::sync::Arc;

use emby_orchestrator_backend::MediaBackend;

use crate::error::{CoreError, CoreResult};
use crate::registry::BackendRegistry;
use crate::traits::{BindingRepository, CodeLedger, FavoritesRepository, ProfileRepository};

/// Service context — holds all shared dependencies.
///
/// The embedding layer creates this once at startup, injecting its storage
/// implementations and the populated registry.
pub struct ServiceContext {
    /// Live backend handle registry.
    pub registry: Arc<BackendRegistry>,
    /// Binding store.
    pub bindings: Arc<dyn BindingRepository>,
    /// Local account records.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Redemption ledger.
    pub codes: Arc<dyn CodeLedger>,
    /// Cached favorites store.
    pub favorites: Arc<dyn FavoritesRepository>,
}

impl ServiceContext {
    /// Create a service context.
    #[must_use]
    pub fn new(
        registry: Arc<BackendRegistry>,
        bindings: Arc<dyn BindingRepository>,
        profiles: Arc<dyn ProfileRepository>,
        codes: Arc<dyn CodeLedger>,
        favorites: Arc<dyn FavoritesRepository>,
    ) -> Self {
        Self {
            registry,
            bindings,
            profiles,
            codes,
            favorites,
        }
    }

    /// Live handle for a backend id.
    pub async fn backend(&self, id: &str) -> CoreResult<Arc<dyn MediaBackend>> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| CoreError::BackendUnavailable {
                backend: id.to_string(),
                detail: "no handle registered".to_string(),
            })
    }
}
