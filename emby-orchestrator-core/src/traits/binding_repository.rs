//! Binding persistence abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Binding;

/// Durable user↔backend account binding store.
///
/// Every operation is one storage transaction; no partial write survives a
/// failure. Multiple process instances may share the underlying store, so
/// implementations rely on store-level isolation, not in-process locks.
#[async_trait]
pub trait BindingRepository: Send + Sync {
    /// Insert a binding. Fails if the (user, backend) pair already exists.
    async fn add(&self, binding: &Binding) -> CoreResult<()>;

    /// Binding for a specific (user, backend) pair.
    async fn get(&self, user_id: i64, backend_id: &str) -> CoreResult<Option<Binding>>;

    /// All bindings of a user, optionally restricted to enabled ones.
    async fn list_for_user(&self, user_id: i64, enabled_only: bool) -> CoreResult<Vec<Binding>>;

    /// The user's primary binding, if any.
    async fn primary(&self, user_id: i64) -> CoreResult<Option<Binding>>;

    /// Designate one backend as the user's primary.
    ///
    /// Clears every existing primary flag for the user and sets the new one
    /// in a single transaction, so no zero- or two-primary state is ever
    /// observable. Returns `BindingNotFound` if the pair does not exist.
    async fn set_primary(&self, user_id: i64, backend_id: &str) -> CoreResult<()>;

    /// Delete one binding. Returns whether a row was removed.
    async fn delete(&self, user_id: i64, backend_id: &str) -> CoreResult<bool>;

    /// Delete all bindings of a user, returning the count removed.
    async fn delete_all_for_user(&self, user_id: i64) -> CoreResult<u64>;

    /// Number of users bound to a backend (enabled bindings only).
    async fn count_users(&self, backend_id: &str) -> CoreResult<u64>;
}
