//! `FavoritesRepository` implementation for [`Store`].

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};

use emby_orchestrator_core::error::{CoreError, CoreResult};
use emby_orchestrator_core::traits::FavoritesRepository;
use emby_orchestrator_core::types::FavoriteItem;

use super::Store;
use super::entity::favorite;

#[async_trait]
impl FavoritesRepository for Store {
    async fn replace(
        &self,
        remote_account_id: &str,
        backend_id: &str,
        items: &[FavoriteItem],
    ) -> CoreResult<()> {
        // Clear-then-insert in one transaction, scoped to this
        // (account, backend) pair only.
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to begin transaction: {e}")))?;

        favorite::Entity::delete_many()
            .filter(favorite::Column::AccountId.eq(remote_account_id))
            .filter(favorite::Column::BackendId.eq(backend_id))
            .exec(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to clear favorites: {e}")))?;

        if !items.is_empty() {
            let rows = items.iter().map(|item| favorite::ActiveModel {
                account_id: Set(remote_account_id.to_string()),
                backend_id: Set(backend_id.to_string()),
                item_id: Set(item.item_id.clone()),
                item_name: Set(item.item_name.clone()),
            });
            favorite::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| CoreError::StorageError(format!("Failed to insert favorites: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to commit transaction: {e}")))?;

        Ok(())
    }

    async fn list(
        &self,
        remote_account_id: &str,
        backend_id: &str,
    ) -> CoreResult<Vec<FavoriteItem>> {
        let rows = favorite::Entity::find()
            .filter(favorite::Column::AccountId.eq(remote_account_id))
            .filter(favorite::Column::BackendId.eq(backend_id))
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query favorites: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| FavoriteItem {
                item_id: row.item_id,
                item_name: row.item_name,
            })
            .collect())
    }
}
