//! Cached favorites persistence abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::FavoriteItem;

/// Local cache of per-(account, backend) favorites lists.
///
/// Rows are always scoped to one (remote account, backend) pair — the same
/// user may hold unrelated accounts on different backends, and their lists
/// must never be merged.
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Replace the cached list for one (account, backend) pair.
    ///
    /// Clear-then-insert in a single transaction; other pairs are untouched.
    async fn replace(
        &self,
        remote_account_id: &str,
        backend_id: &str,
        items: &[FavoriteItem],
    ) -> CoreResult<()>;

    /// Cached list for one (account, backend) pair.
    async fn list(&self, remote_account_id: &str, backend_id: &str)
        -> CoreResult<Vec<FavoriteItem>>;
}
