//! Storage layer and notification abstraction traits.

mod alert_sink;
mod binding_repository;
mod code_ledger;
mod favorites_repository;
mod profile_repository;

pub use alert_sink::AlertSink;
pub use binding_repository::BindingRepository;
pub use code_ledger::{CodeClaim, CodeLedger};
pub use favorites_repository::FavoritesRepository;
pub use profile_repository::ProfileRepository;
