//! `BindingRepository` implementation for [`Store`].

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};

use emby_orchestrator_core::error::{CoreError, CoreResult};
use emby_orchestrator_core::traits::BindingRepository;
use emby_orchestrator_core::types::Binding;

use super::Store;
use super::entity::binding;

impl binding::Model {
    /// Convert a `SeaORM` row model into a domain `Binding`.
    fn into_binding(self) -> CoreResult<Binding> {
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| CoreError::SerializationError(format!("Invalid created_at: {e}")))?
            .with_timezone(&chrono::Utc);

        Ok(Binding {
            user_id: self.user_id,
            backend_id: self.backend_id,
            remote_account_id: self.remote_account_id,
            is_primary: self.is_primary != 0,
            enabled: self.enabled != 0,
            created_at,
        })
    }
}

/// Convert a domain `Binding` into a `SeaORM` active model.
fn binding_to_active_model(binding: &Binding) -> binding::ActiveModel {
    binding::ActiveModel {
        user_id: Set(binding.user_id),
        backend_id: Set(binding.backend_id.clone()),
        remote_account_id: Set(binding.remote_account_id.clone()),
        is_primary: Set(i32::from(binding.is_primary)),
        enabled: Set(i32::from(binding.enabled)),
        created_at: Set(binding.created_at.to_rfc3339()),
    }
}

#[async_trait]
impl BindingRepository for Store {
    async fn add(&self, binding: &Binding) -> CoreResult<()> {
        let existing = binding::Entity::find_by_id((binding.user_id, binding.backend_id.clone()))
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query binding: {e}")))?;
        if existing.is_some() {
            return Err(CoreError::BindingExists {
                user_id: binding.user_id,
                backend_id: binding.backend_id.clone(),
            });
        }

        binding::Entity::insert(binding_to_active_model(binding))
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to insert binding: {e}")))?;

        Ok(())
    }

    async fn get(&self, user_id: i64, backend_id: &str) -> CoreResult<Option<Binding>> {
        let row = binding::Entity::find_by_id((user_id, backend_id.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query binding: {e}")))?;

        row.map(binding::Model::into_binding).transpose()
    }

    async fn list_for_user(&self, user_id: i64, enabled_only: bool) -> CoreResult<Vec<Binding>> {
        let mut query = binding::Entity::find().filter(binding::Column::UserId.eq(user_id));
        if enabled_only {
            query = query.filter(binding::Column::Enabled.ne(0));
        }

        let rows = query
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query bindings: {e}")))?;

        rows.into_iter().map(binding::Model::into_binding).collect()
    }

    async fn primary(&self, user_id: i64) -> CoreResult<Option<Binding>> {
        let row = binding::Entity::find()
            .filter(binding::Column::UserId.eq(user_id))
            .filter(binding::Column::IsPrimary.ne(0))
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query binding: {e}")))?;

        row.map(binding::Model::into_binding).transpose()
    }

    async fn set_primary(&self, user_id: i64, backend_id: &str) -> CoreResult<()> {
        // Clear-then-set in one transaction so no zero- or two-primary state
        // is ever visible.
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to begin transaction: {e}")))?;

        let target = binding::Entity::find_by_id((user_id, backend_id.to_string()))
            .one(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query binding: {e}")))?;
        if target.is_none() {
            return Err(CoreError::BindingNotFound {
                user_id,
                backend_id: Some(backend_id.to_string()),
            });
        }

        binding::Entity::update_many()
            .col_expr(binding::Column::IsPrimary, Expr::value(0))
            .filter(binding::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to clear primary: {e}")))?;

        binding::Entity::update_many()
            .col_expr(binding::Column::IsPrimary, Expr::value(1))
            .filter(binding::Column::UserId.eq(user_id))
            .filter(binding::Column::BackendId.eq(backend_id))
            .exec(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to set primary: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to commit transaction: {e}")))?;

        Ok(())
    }

    async fn delete(&self, user_id: i64, backend_id: &str) -> CoreResult<bool> {
        let result = binding::Entity::delete_many()
            .filter(binding::Column::UserId.eq(user_id))
            .filter(binding::Column::BackendId.eq(backend_id))
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to delete binding: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_all_for_user(&self, user_id: i64) -> CoreResult<u64> {
        let result = binding::Entity::delete_many()
            .filter(binding::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to delete bindings: {e}")))?;

        Ok(result.rows_affected)
    }

    async fn count_users(&self, backend_id: &str) -> CoreResult<u64> {
        binding::Entity::find()
            .filter(binding::Column::BackendId.eq(backend_id))
            .filter(binding::Column::Enabled.ne(0))
            .count(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to count bindings: {e}")))
    }
}
