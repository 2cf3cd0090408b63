//! Core data types.

mod binding;
mod code;
mod fanout;
mod health;
mod profile;

pub use binding::Binding;
pub use code::{CodeKind, EntitlementUpdate, RedeemCode, RedeemGrant};
pub use fanout::{FanoutReport, TargetFailure};
pub use health::{BackendHealth, HealthState};
pub use profile::{NewAccount, Profile, UserLevel};

// Re-export backend-level types commonly seen at this layer.
pub use emby_orchestrator_backend::{
    BackendDescriptor, CreatedAccount, FavoriteItem, RemoteUser,
};
