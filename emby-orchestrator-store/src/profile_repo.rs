//! `ProfileRepository` implementation for [`Store`].

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

use emby_orchestrator_core::error::{CoreError, CoreResult};
use emby_orchestrator_core::traits::ProfileRepository;
use emby_orchestrator_core::types::{NewAccount, Profile, UserLevel};

use super::Store;
use super::entity::profile;

impl profile::Model {
    /// Convert a `SeaORM` row model into a domain `Profile`.
    fn into_profile(self) -> CoreResult<Profile> {
        let level = UserLevel::parse(&self.level)
            .ok_or_else(|| CoreError::SerializationError(format!("Invalid level: {}", self.level)))?;
        let expires_at = parse_opt_rfc3339(self.expires_at.as_deref(), "expires_at")?;
        let created_at = parse_opt_rfc3339(self.created_at.as_deref(), "created_at")?;

        Ok(Profile {
            user_id: self.user_id,
            account_id: self.account_id,
            account_name: self.account_name,
            password: self.password,
            level,
            expires_at,
            credit_days: self.credit_days,
            created_at,
        })
    }
}

fn parse_opt_rfc3339(
    value: Option<&str>,
    field: &str,
) -> CoreResult<Option<chrono::DateTime<chrono::Utc>>> {
    value
        .map(|s| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
        })
        .transpose()
}

/// Convert a domain `Profile` into a `SeaORM` active model for upsert.
fn profile_to_active_model(profile: &Profile) -> profile::ActiveModel {
    profile::ActiveModel {
        user_id: Set(profile.user_id),
        account_id: Set(profile.account_id.clone()),
        account_name: Set(profile.account_name.clone()),
        password: Set(profile.password.clone()),
        level: Set(profile.level.as_str().to_string()),
        expires_at: Set(profile.expires_at.map(|dt| dt.to_rfc3339())),
        credit_days: Set(profile.credit_days),
        created_at: Set(profile.created_at.map(|dt| dt.to_rfc3339())),
    }
}

#[async_trait]
impl ProfileRepository for Store {
    async fn find(&self, user_id: i64) -> CoreResult<Option<Profile>> {
        let row = profile::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query profile: {e}")))?;

        row.map(profile::Model::into_profile).transpose()
    }

    async fn upsert(&self, profile: &Profile) -> CoreResult<()> {
        profile::Entity::insert(profile_to_active_model(profile))
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(profile::Column::UserId)
                    .update_columns([
                        profile::Column::AccountId,
                        profile::Column::AccountName,
                        profile::Column::Password,
                        profile::Column::Level,
                        profile::Column::ExpiresAt,
                        profile::Column::CreditDays,
                        profile::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to save profile: {e}")))?;

        Ok(())
    }

    async fn attach_account(
        &self,
        user_id: i64,
        account: &NewAccount,
        consume_credit: bool,
    ) -> CoreResult<()> {
        let row = profile::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query profile: {e}")))?;
        if row.is_none() {
            return Err(CoreError::ProfileNotFound(user_id));
        }

        let mut active = profile::ActiveModel {
            user_id: Set(user_id),
            account_id: Set(Some(account.account_id.clone())),
            account_name: Set(Some(account.account_name.clone())),
            password: Set(Some(account.password.clone())),
            level: Set(UserLevel::Standard.as_str().to_string()),
            expires_at: Set(Some(account.expires_at.to_rfc3339())),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };
        if consume_credit {
            active.credit_days = Set(0);
        }

        active
            .update(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to attach account: {e}")))?;

        Ok(())
    }

    async fn clear_account(&self, user_id: i64) -> CoreResult<()> {
        let row = profile::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query profile: {e}")))?;
        if row.is_none() {
            return Err(CoreError::ProfileNotFound(user_id));
        }

        let active = profile::ActiveModel {
            user_id: Set(user_id),
            account_id: Set(None),
            account_name: Set(None),
            password: Set(None),
            level: Set(UserLevel::Unregistered.as_str().to_string()),
            expires_at: Set(None),
            ..Default::default()
        };

        active
            .update(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to clear account: {e}")))?;

        Ok(())
    }

    async fn list_with_accounts(&self) -> CoreResult<Vec<Profile>> {
        let rows = profile::Entity::find()
            .filter(profile::Column::AccountId.is_not_null())
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query profiles: {e}")))?;

        rows.into_iter().map(profile::Model::into_profile).collect()
    }
}
