//! `CodeLedger` implementation for [`Store`].
//!
//! Exactly-once consumption is decided by a conditional update ("set
//! consumer where consumer is unset") issued as the first statement of a
//! transaction; the affected-row count picks the winner. `SQLite` serializes
//! writers, so no row locking beyond the transaction itself is needed.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait, sea_query::Expr,
};

use emby_orchestrator_core::error::{CoreError, CoreResult};
use emby_orchestrator_core::traits::{CodeClaim, CodeLedger};
use emby_orchestrator_core::types::{CodeKind, EntitlementUpdate, RedeemCode, UserLevel};

use super::Store;
use super::entity::{code, profile};

impl code::Model {
    /// Convert a `SeaORM` row model into a domain `RedeemCode`.
    fn into_code(self) -> CoreResult<RedeemCode> {
        let kind = CodeKind::parse(&self.kind)
            .ok_or_else(|| CoreError::SerializationError(format!("Invalid kind: {}", self.kind)))?;
        let consumed_at = self
            .consumed_at
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| CoreError::SerializationError(format!("Invalid consumed_at: {e}")))
            })
            .transpose()?;

        Ok(RedeemCode {
            code: self.code,
            issuer: self.issuer,
            duration_days: self.duration_days,
            kind,
            consumed_by: self.consumed_by,
            consumed_at,
        })
    }
}

/// An open claim: the transaction that already marked the code consumed.
struct SqliteClaim {
    txn: DatabaseTransaction,
    code: RedeemCode,
}

impl SqliteClaim {
    async fn rollback(txn: DatabaseTransaction) {
        if let Err(e) = txn.rollback().await {
            log::error!("Failed to roll back code claim: {e}");
        }
    }
}

#[async_trait]
impl CodeClaim for SqliteClaim {
    fn code(&self) -> &RedeemCode {
        &self.code
    }

    async fn commit(self: Box<Self>, update: EntitlementUpdate) -> CoreResult<()> {
        let txn = self.txn;

        match update {
            EntitlementUpdate::Renewal {
                user_id,
                new_expiry,
                reinstate,
            } => {
                let Some(row) = find_profile(&txn, user_id).await? else {
                    Self::rollback(txn).await;
                    return Err(CoreError::ProfileNotFound(user_id));
                };

                let mut active = profile::ActiveModel {
                    user_id: Set(user_id),
                    expires_at: Set(Some(new_expiry.to_rfc3339())),
                    ..Default::default()
                };
                if reinstate && row.level == UserLevel::Suspended.as_str() {
                    active.level = Set(UserLevel::Standard.as_str().to_string());
                }
                if let Err(e) = active.update(&txn).await {
                    Self::rollback(txn).await;
                    return Err(CoreError::StorageError(format!(
                        "Failed to update expiry: {e}"
                    )));
                }
            }
            EntitlementUpdate::RegistrationCredit { user_id, days } => {
                let Some(row) = find_profile(&txn, user_id).await? else {
                    Self::rollback(txn).await;
                    return Err(CoreError::ProfileNotFound(user_id));
                };
                // Credit invariant re-checked under the claim: a concurrent
                // redemption may have granted credit since the caller's read.
                if row.credit_days > 0 {
                    Self::rollback(txn).await;
                    return Err(CoreError::AlreadyHasCredit(user_id));
                }

                // Credit is additive across redemptions.
                let active = profile::ActiveModel {
                    user_id: Set(user_id),
                    credit_days: Set(row.credit_days + days),
                    ..Default::default()
                };
                if let Err(e) = active.update(&txn).await {
                    Self::rollback(txn).await;
                    return Err(CoreError::StorageError(format!(
                        "Failed to update credit: {e}"
                    )));
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to commit claim: {e}")))
    }

    async fn abort(self: Box<Self>) -> CoreResult<()> {
        self.txn
            .rollback()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to roll back claim: {e}")))
    }
}

async fn find_profile(
    txn: &DatabaseTransaction,
    user_id: i64,
) -> CoreResult<Option<profile::Model>> {
    profile::Entity::find_by_id(user_id)
        .one(txn)
        .await
        .map_err(|e| CoreError::StorageError(format!("Failed to query profile: {e}")))
}

#[async_trait]
impl CodeLedger for Store {
    async fn insert(&self, code: &RedeemCode) -> CoreResult<()> {
        let active = code::ActiveModel {
            code: Set(code.code.clone()),
            issuer: Set(code.issuer),
            duration_days: Set(code.duration_days),
            kind: Set(code.kind.as_str().to_string()),
            consumed_by: Set(code.consumed_by),
            consumed_at: Set(code.consumed_at.map(|dt| dt.to_rfc3339())),
        };

        code::Entity::insert(active)
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to insert code: {e}")))?;

        Ok(())
    }

    async fn find(&self, code: &str) -> CoreResult<Option<RedeemCode>> {
        let row = code::Entity::find_by_id(code)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query code: {e}")))?;

        row.map(code::Model::into_code).transpose()
    }

    async fn begin(&self, code_str: &str, redeemer: i64) -> CoreResult<Box<dyn CodeClaim>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to begin transaction: {e}")))?;

        // Conditional update first: takes the write lock immediately and
        // decides the winner from the affected-row count.
        let result = code::Entity::update_many()
            .col_expr(code::Column::ConsumedBy, Expr::value(redeemer))
            .col_expr(
                code::Column::ConsumedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(code::Column::Code.eq(code_str))
            .filter(code::Column::ConsumedBy.is_null())
            .exec(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to claim code: {e}")))?;

        if result.rows_affected == 0 {
            let row = code::Entity::find_by_id(code_str)
                .one(&txn)
                .await
                .map_err(|e| CoreError::StorageError(format!("Failed to query code: {e}")))?;
            SqliteClaim::rollback(txn).await;
            return match row {
                None => Err(CoreError::CodeNotFound(code_str.to_string())),
                Some(winner) => Err(CoreError::CodeAlreadyUsed {
                    code: code_str.to_string(),
                    used_by: winner.consumed_by,
                }),
            };
        }

        let row = code::Entity::find_by_id(code_str)
            .one(&txn)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query code: {e}")))?;
        let Some(row) = row else {
            SqliteClaim::rollback(txn).await;
            return Err(CoreError::CodeNotFound(code_str.to_string()));
        };

        Ok(Box::new(SqliteClaim {
            txn,
            code: row.into_code()?,
        }))
    }
}
