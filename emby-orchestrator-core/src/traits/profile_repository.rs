//! Profile persistence abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{NewAccount, Profile};

/// Local account record store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Profile of a user, if one exists.
    async fn find(&self, user_id: i64) -> CoreResult<Option<Profile>>;

    /// Insert or update a profile.
    async fn upsert(&self, profile: &Profile) -> CoreResult<()>;

    /// Attach a freshly provisioned account to the profile.
    ///
    /// Sets account id/name/password, expiry and creation time, promotes the
    /// level to Standard, and (when `consume_credit` is set) zeroes the
    /// registration credit in the same write.
    async fn attach_account(
        &self,
        user_id: i64,
        account: &NewAccount,
        consume_credit: bool,
    ) -> CoreResult<()>;

    /// Clear the account record: account fields to null, level back to
    /// Unregistered, expiry removed. The profile row itself is kept.
    async fn clear_account(&self, user_id: i64) -> CoreResult<()>;

    /// All profiles that currently have an account attached.
    async fn list_with_accounts(&self) -> CoreResult<Vec<Profile>>;
}
