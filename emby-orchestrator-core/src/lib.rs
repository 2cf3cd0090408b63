//! Emby Orchestrator Core Library
//!
//! Provides the orchestration logic for provisioning user accounts across a
//! fleet of media-server backends, including:
//! - Backend registry (live handles + descriptors)
//! - Account fan-out orchestration (create / delete / policy)
//! - Exactly-once code redemption
//! - Fleet health monitoring with edge-triggered alerts
//! - Favorites reconciliation
//!
//! This library is platform-independent: the storage layer and the alert
//! channel are abstracted through traits and injected by the embedding
//! application.

pub mod error;
pub mod registry;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use registry::BackendRegistry;
pub use services::{
    AccountOrchestrator, FavoritesSync, HealthMonitor, RedemptionService, ServiceContext,
    SyncSummary,
};
pub use traits::{
    AlertSink, BindingRepository, CodeClaim, CodeLedger, FavoritesRepository, ProfileRepository,
};
