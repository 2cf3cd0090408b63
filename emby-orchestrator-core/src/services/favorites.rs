//! Favorites reconciliation between backends and local storage.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::Binding;

/// Outcome of a reconciliation sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// Bindings whose favorites were refreshed.
    pub synced: usize,
    /// Bindings skipped because their backend fetch failed.
    pub skipped: usize,
    /// Total favorite items stored across synced bindings.
    pub items: usize,
}

/// Pulls favorite lists from backends and mirrors them locally.
///
/// Each binding's snapshot is scoped to its `(account, backend)` pair, so
/// a failed fetch on one backend never clobbers rows mirrored from another.
pub struct FavoritesSync {
    ctx: Arc<ServiceContext>,
}

impl FavoritesSync {
    /// Create a reconciler instance.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Refresh the stored favorites for every enabled binding of `user_id`.
    pub async fn sync_user(&self, user_id: i64) -> CoreResult<SyncSummary> {
        let bindings = self.ctx.bindings.list_for_user(user_id, true).await?;
        if bindings.is_empty() {
            return Err(CoreError::BindingNotFound {
                user_id,
                backend_id: None,
            });
        }
        Ok(self.sync_bindings(&bindings).await)
    }

    /// Refresh favorites for every user that currently has an account.
    ///
    /// Per-user failures are absorbed into the summary so one broken user
    /// never aborts the sweep.
    pub async fn sync_all(&self) -> CoreResult<SyncSummary> {
        let profiles = self.ctx.profiles.list_with_accounts().await?;
        let mut total = SyncSummary::default();

        for profile in profiles {
            let bindings = self
                .ctx
                .bindings
                .list_for_user(profile.user_id, true)
                .await?;
            let summary = self.sync_bindings(&bindings).await;
            total.synced += summary.synced;
            total.skipped += summary.skipped;
            total.items += summary.items;
        }

        log::info!(
            "Favorites sweep done: {} bindings synced, {} skipped, {} items",
            total.synced,
            total.skipped,
            total.items
        );
        Ok(total)
    }

    async fn sync_bindings(&self, bindings: &[Binding]) -> SyncSummary {
        let tasks = bindings.iter().map(|binding| async move {
            let handle = self.ctx.backend(&binding.backend_id).await?;
            let items = handle.list_favorites(&binding.remote_account_id).await?;
            let count = items.len();
            self.ctx
                .favorites
                .replace(&binding.remote_account_id, &binding.backend_id, &items)
                .await?;
            Ok::<usize, CoreError>(count)
        });

        let mut summary = SyncSummary::default();
        for (binding, outcome) in bindings.iter().zip(join_all(tasks).await) {
            match outcome {
                Ok(count) => {
                    summary.synced += 1;
                    summary.items += count;
                }
                Err(e) => {
                    log::warn!(
                        "[{}] Skipping favorites for account {}: {e}",
                        binding.backend_id,
                        binding.remote_account_id
                    );
                    summary.skipped += 1;
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_env;
    use crate::traits::{BindingRepository, FavoritesRepository, ProfileRepository};
    use crate::types::{Binding, FavoriteItem, Profile, UserLevel};

    const USER: i64 = 555;

    async fn bind(env: &crate::test_utils::TestEnv, backend: &str, account: &str, primary: bool) {
        env.bindings
            .add(&Binding::new(USER, backend, account, primary))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sync_user_mirrors_each_binding() {
        let env = test_env(&["anime", "movie"]).await;
        bind(&env, "anime", "acc-a", true).await;
        bind(&env, "movie", "acc-m", false).await;
        env.backend("anime").seed_favorite("acc-a", "item-1", "Frieren");
        env.backend("movie").seed_favorite("acc-m", "item-2", "Heat");
        env.backend("movie").seed_favorite("acc-m", "item-3", "Ronin");
        let sync = FavoritesSync::new(env.ctx.clone());

        let summary = sync.sync_user(USER).await.unwrap();
        assert_eq!(summary, SyncSummary { synced: 2, skipped: 0, items: 3 });

        let anime = env.favorites.list("acc-a", "anime").await.unwrap();
        assert_eq!(anime.len(), 1);
        assert_eq!(anime[0].item_name, "Frieren");
        let movie = env.favorites.list("acc-m", "movie").await.unwrap();
        assert_eq!(movie.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_skips_only_that_binding() {
        let env = test_env(&["anime", "movie"]).await;
        bind(&env, "anime", "acc-a", true).await;
        bind(&env, "movie", "acc-m", false).await;
        env.backend("anime").seed_favorite("acc-a", "item-1", "Frieren");
        // Pre-existing mirror for the failing backend must survive intact.
        env.favorites
            .replace(
                "acc-m",
                "movie",
                &[FavoriteItem {
                    item_id: "old".to_string(),
                    item_name: "Stale".to_string(),
                }],
            )
            .await
            .unwrap();
        env.backend("movie").fail_favorites();
        let sync = FavoritesSync::new(env.ctx.clone());

        let summary = sync.sync_user(USER).await.unwrap();
        assert_eq!(summary.synced, 1);
        assert_eq!(summary.skipped, 1);

        let kept = env.favorites.list("acc-m", "movie").await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].item_id, "old");
    }

    #[tokio::test]
    async fn empty_remote_list_clears_the_mirror() {
        let env = test_env(&["anime"]).await;
        bind(&env, "anime", "acc-a", true).await;
        env.favorites
            .replace(
                "acc-a",
                "anime",
                &[FavoriteItem {
                    item_id: "old".to_string(),
                    item_name: "Stale".to_string(),
                }],
            )
            .await
            .unwrap();
        let sync = FavoritesSync::new(env.ctx.clone());

        sync.sync_user(USER).await.unwrap();
        assert!(env.favorites.list("acc-a", "anime").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sync_user_without_bindings_is_an_error() {
        let env = test_env(&["anime"]).await;
        let sync = FavoritesSync::new(env.ctx.clone());
        let result = sync.sync_user(USER).await;
        assert!(matches!(result, Err(CoreError::BindingNotFound { .. })));
    }

    #[tokio::test]
    async fn sync_all_covers_every_account_holder() {
        let env = test_env(&["anime"]).await;
        for (user, account) in [(1_i64, "acc-1"), (2, "acc-2")] {
            let mut profile = Profile::new(user);
            profile.account_id = Some(account.to_string());
            profile.account_name = Some(format!("user{user}"));
            profile.level = UserLevel::Standard;
            env.profiles.upsert(&profile).await.unwrap();
            env.bindings
                .add(&Binding::new(user, "anime", account, true))
                .await
                .unwrap();
            env.backend("anime").seed_favorite(account, "item-x", "Thing");
        }
        // A profile with no account is ignored by the sweep.
        env.profiles.upsert(&Profile::new(3)).await.unwrap();
        let sync = FavoritesSync::new(env.ctx.clone());

        let summary = sync.sync_all().await.unwrap();
        assert_eq!(summary.synced, 2);
        assert_eq!(summary.items, 2);
    }
}
