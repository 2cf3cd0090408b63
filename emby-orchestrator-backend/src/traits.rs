use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CreatedAccount, FavoriteItem, RemoteUser};

/// Media server backend capability surface.
///
/// One handle is bound to one configured backend for the lifetime of the
/// process. Expected conditions (user not found, backend rejects a call)
/// are returned as typed [`BackendError`](crate::BackendError) values,
/// never panics.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Backend identifier (the descriptor's slug).
    fn id(&self) -> &str;

    /// Provision a new account with a generated password.
    ///
    /// `days` determines the expiry carried back in [`CreatedAccount`];
    /// the remote side only stores the account itself.
    async fn create_user(&self, name: &str, days: i64) -> Result<CreatedAccount>;

    /// Delete a remote account by id.
    async fn delete_user(&self, account_id: &str) -> Result<()>;

    /// Enable or disable an account's access policy.
    async fn set_policy(&self, account_id: &str, disable: bool) -> Result<()>;

    /// List all accounts on the backend. Also used as the health probe.
    async fn list_users(&self) -> Result<Vec<RemoteUser>>;

    /// Look up an account by exact name.
    async fn lookup_by_name(&self, name: &str) -> Result<Option<RemoteUser>>;

    /// Fetch the favorites list of an account.
    async fn list_favorites(&self, account_id: &str) -> Result<Vec<FavoriteItem>>;

    /// Number of sessions currently playing media.
    async fn playing_count(&self) -> Result<u64>;

    /// Release any resources held by the handle. Called once at shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
