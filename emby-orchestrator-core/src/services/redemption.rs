//! Code redemption engine.
//!
//! Grants account creation credit or time extension in exchange for
//! exactly-once consumption of a code. The exactly-once guarantee comes
//! from the ledger's conditional update, decided by affected-row count;
//! concurrent attempts against the same code serialize to a strict
//! winner-takes-all order.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::CodeClaim;
use crate::types::{CodeKind, EntitlementUpdate, Profile, RedeemGrant, UserLevel};

/// Redemption engine over the code ledger and the profile store.
pub struct RedemptionService {
    ctx: Arc<ServiceContext>,
}

impl RedemptionService {
    /// Create a redemption service instance.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Redeem `code` on behalf of `user_id`.
    ///
    /// The claim is held open across any required remote call: a renewal
    /// that must lift a remote suspension only commits once the un-suspend
    /// succeeded, so a failed remote call leaves both the code and the
    /// profile untouched.
    pub async fn redeem(&self, user_id: i64, code: &str) -> CoreResult<RedeemGrant> {
        let profile = self
            .ctx
            .profiles
            .find(user_id)
            .await?
            .ok_or(CoreError::ProfileNotFound(user_id))?;

        // Cheap pre-checks before touching the ledger. The credit invariant
        // is re-checked inside the commit transaction, since two attempts by
        // the same user could both pass this read.
        if let Some(kind) = self.ctx.codes.find(code).await?.map(|c| c.kind) {
            self.precheck(kind, &profile)?;
        }

        let claim = self.ctx.codes.begin(code, user_id).await?;
        let consumed = claim.code().clone();

        match consumed.kind {
            CodeKind::Registration => {
                if let Err(e) = self.precheck(CodeKind::Registration, &profile) {
                    abort_quietly(claim).await;
                    return Err(e);
                }
                claim
                    .commit(EntitlementUpdate::RegistrationCredit {
                        user_id,
                        days: consumed.duration_days,
                    })
                    .await?;
                log::info!(
                    "User {user_id} redeemed registration code from {} (+{} days credit)",
                    consumed.issuer,
                    consumed.duration_days
                );
                Ok(RedeemGrant {
                    kind: CodeKind::Registration,
                    issuer: consumed.issuer,
                    days: consumed.duration_days,
                    new_expiry: None,
                    reinstated: false,
                })
            }
            CodeKind::Renewal => {
                if !profile.has_account() {
                    abort_quietly(claim).await;
                    return Err(CoreError::NoAccountToRenew(user_id));
                }
                self.renew(user_id, &profile, claim, consumed.duration_days, consumed.issuer)
                    .await
            }
        }
    }

    fn precheck(&self, kind: CodeKind, profile: &Profile) -> CoreResult<()> {
        match kind {
            CodeKind::Registration => {
                if profile.has_account() {
                    return Err(CoreError::AlreadyRegistered(profile.user_id));
                }
                if profile.credit_days > 0 {
                    return Err(CoreError::AlreadyHasCredit(profile.user_id));
                }
            }
            CodeKind::Renewal => {
                if !profile.has_account() {
                    return Err(CoreError::NoAccountToRenew(profile.user_id));
                }
            }
        }
        Ok(())
    }

    async fn renew(
        &self,
        user_id: i64,
        profile: &Profile,
        claim: Box<dyn CodeClaim>,
        days: i64,
        issuer: i64,
    ) -> CoreResult<RedeemGrant> {
        let now = Utc::now();

        if profile.is_expired(now) {
            // Expired account: restart from the redemption time and lift any
            // remote suspension. The un-suspend must succeed before the
            // local expiry commits.
            let new_expiry = now + Duration::days(days);

            let primary = match self.ctx.bindings.primary(user_id).await {
                Ok(Some(binding)) => binding,
                Ok(None) => {
                    abort_quietly(claim).await;
                    return Err(CoreError::NoAccountToRenew(user_id));
                }
                Err(e) => {
                    abort_quietly(claim).await;
                    return Err(e);
                }
            };
            let handle = match self.ctx.backend(&primary.backend_id).await {
                Ok(handle) => handle,
                Err(e) => {
                    abort_quietly(claim).await;
                    return Err(e);
                }
            };
            if let Err(e) = handle.set_policy(&primary.remote_account_id, false).await {
                log::warn!(
                    "[{}] Un-suspend failed for user {user_id}, refunding code: {e}",
                    primary.backend_id
                );
                abort_quietly(claim).await;
                return Err(e.into());
            }

            claim
                .commit(EntitlementUpdate::Renewal {
                    user_id,
                    new_expiry,
                    reinstate: true,
                })
                .await?;

            let reinstated = profile.level == UserLevel::Suspended;
            log::info!(
                "User {user_id} renewed expired account (+{days} days, until {new_expiry})"
            );
            Ok(RedeemGrant {
                kind: CodeKind::Renewal,
                issuer,
                days,
                new_expiry: Some(new_expiry),
                reinstated,
            })
        } else {
            // Active account: extend from the old expiry, never reset to now.
            let old_expiry = profile.expires_at.unwrap_or(now);
            let new_expiry = old_expiry + Duration::days(days);

            claim
                .commit(EntitlementUpdate::Renewal {
                    user_id,
                    new_expiry,
                    reinstate: false,
                })
                .await?;

            log::info!("User {user_id} extended account (+{days} days, until {new_expiry})");
            Ok(RedeemGrant {
                kind: CodeKind::Renewal,
                issuer,
                days,
                new_expiry: Some(new_expiry),
                reinstated: false,
            })
        }
    }
}

/// Roll back a claim, logging instead of propagating any rollback error so
/// the failure that triggered the abort stays the one reported.
async fn abort_quietly(claim: Box<dyn CodeClaim>) {
    if let Err(e) = claim.abort().await {
        log::error!("Failed to roll back code claim: {e}");
    }
}
