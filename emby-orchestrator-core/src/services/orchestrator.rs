//! Cross-backend account orchestration.
//!
//! Translates one logical account operation into one-or-many remote calls
//! and reduces their independently-fallible outcomes into a single local
//! state change. Fan-outs always wait for every target; one unreachable
//! backend never blocks or fails the others.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Binding, CreatedAccount, FanoutReport, NewAccount};

/// Cross-backend account operations.
pub struct AccountOrchestrator {
    ctx: Arc<ServiceContext>,
}

impl AccountOrchestrator {
    /// Create an orchestrator instance.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Provision an account for `user_id` on one backend.
    ///
    /// On success a binding is written (primary if the user had none) and,
    /// when the binding became primary, the account is attached to the
    /// user's profile. A binding write failure rolls the remote account
    /// back so no orphan is left behind.
    pub async fn create_on(
        &self,
        backend_id: &str,
        user_id: i64,
        name: &str,
        days: i64,
    ) -> CoreResult<CreatedAccount> {
        self.create_inner(backend_id, user_id, name, days, false)
            .await
    }

    /// Provision an account funded by the user's registration credit.
    ///
    /// The credit is read up front (`NoRegistrationCredit` if none) and
    /// zeroed in the same write that attaches the account.
    pub async fn create_from_credit(
        &self,
        backend_id: &str,
        user_id: i64,
        name: &str,
    ) -> CoreResult<CreatedAccount> {
        let profile = self
            .ctx
            .profiles
            .find(user_id)
            .await?
            .ok_or(CoreError::ProfileNotFound(user_id))?;
        if profile.has_account() {
            return Err(CoreError::AlreadyRegistered(user_id));
        }
        if profile.credit_days <= 0 {
            return Err(CoreError::NoRegistrationCredit(user_id));
        }
        self.create_inner(backend_id, user_id, name, profile.credit_days, true)
            .await
    }

    async fn create_inner(
        &self,
        backend_id: &str,
        user_id: i64,
        name: &str,
        days: i64,
        consume_credit: bool,
    ) -> CoreResult<CreatedAccount> {
        let handle = self.ctx.backend(backend_id).await?;

        if self.ctx.bindings.get(user_id, backend_id).await?.is_some() {
            return Err(CoreError::BindingExists {
                user_id,
                backend_id: backend_id.to_string(),
            });
        }

        let created = handle.create_user(name, days).await?;
        let is_primary = self.ctx.bindings.primary(user_id).await?.is_none();

        let binding = Binding::new(user_id, backend_id, created.account_id.clone(), is_primary);
        if let Err(e) = self.ctx.bindings.add(&binding).await {
            log::error!("Failed to persist binding for user {user_id}, cleaning up: {e}");
            if let Err(cleanup_err) = handle.delete_user(&created.account_id).await {
                log::warn!(
                    "Cleanup: failed to delete remote account {} on {backend_id}: {cleanup_err}",
                    created.account_id
                );
            }
            return Err(e);
        }

        if is_primary {
            let account = NewAccount {
                account_id: created.account_id.clone(),
                account_name: name.to_string(),
                password: created.password.clone(),
                expires_at: created.expires_at,
            };
            self.ctx
                .profiles
                .attach_account(user_id, &account, consume_credit)
                .await?;
        }

        log::info!(
            "Created account '{name}' for user {user_id} on {backend_id} (primary: {is_primary})"
        );
        Ok(created)
    }

    /// Delete the user's accounts on every bound backend.
    ///
    /// All deletes run concurrently and every outcome is collected. If any
    /// backend succeeded, the local account record is cleared and **all**
    /// bindings are removed — convergence wins over dangling bindings whose
    /// remote meaning is moot. If none succeeded, local state is untouched
    /// and the whole operation stays retryable.
    pub async fn delete_everywhere(&self, user_id: i64) -> CoreResult<FanoutReport> {
        let bindings = self.ctx.bindings.list_for_user(user_id, true).await?;
        if bindings.is_empty() {
            return Err(CoreError::BindingNotFound {
                user_id,
                backend_id: None,
            });
        }

        let deletes = bindings.iter().map(|binding| async {
            let outcome = match self.ctx.backend(&binding.backend_id).await {
                Ok(handle) => handle
                    .delete_user(&binding.remote_account_id)
                    .await
                    .map_err(CoreError::from),
                Err(e) => Err(e),
            };
            (binding.backend_id.clone(), outcome)
        });

        let mut report = FanoutReport::new();
        for (backend_id, outcome) in join_all(deletes).await {
            match outcome {
                Ok(()) => report.record_ok(backend_id),
                Err(e) => {
                    log::warn!("[{backend_id}] Delete failed for user {user_id}: {e}");
                    report.record_err(backend_id, e.to_string());
                }
            }
        }

        if !report.any_succeeded() {
            return Err(CoreError::AllTargetsFailed {
                failures: report.failures,
            });
        }

        self.ctx.profiles.clear_account(user_id).await?;
        let removed = self.ctx.bindings.delete_all_for_user(user_id).await?;
        log::info!(
            "Deleted user {user_id} on {}/{} backend(s), removed {removed} binding(s)",
            report.succeeded.len(),
            report.len()
        );
        Ok(report)
    }

    /// Enable or disable the user's account on every bound backend.
    ///
    /// Best-effort fan-out: no local state changes, the per-backend outcome
    /// table is returned for visibility. Callers that need an all-or-error
    /// answer can apply [`FanoutReport::require_all`].
    pub async fn change_policy_everywhere(
        &self,
        user_id: i64,
        disable: bool,
    ) -> CoreResult<FanoutReport> {
        let bindings = self.ctx.bindings.list_for_user(user_id, true).await?;
        if bindings.is_empty() {
            return Err(CoreError::BindingNotFound {
                user_id,
                backend_id: None,
            });
        }

        let calls = bindings.iter().map(|binding| async {
            let outcome = match self.ctx.backend(&binding.backend_id).await {
                Ok(handle) => handle
                    .set_policy(&binding.remote_account_id, disable)
                    .await
                    .map_err(CoreError::from),
                Err(e) => Err(e),
            };
            (binding.backend_id.clone(), outcome)
        });

        let mut report = FanoutReport::new();
        for (backend_id, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => report.record_ok(backend_id),
                Err(e) => {
                    log::warn!(
                        "[{backend_id}] Policy change (disable={disable}) failed for user {user_id}: {e}"
                    );
                    report.record_err(backend_id, e.to_string());
                }
            }
        }
        Ok(report)
    }

    /// Locate and delete an account known only by a remote identifier.
    ///
    /// Used when no local record exists. Scans every registered backend:
    /// first a delete by id, then a lookup by name followed by a delete.
    /// Returns the backend that matched, if any.
    pub async fn find_and_delete_by_identifier(
        &self,
        identifier: &str,
    ) -> CoreResult<Option<String>> {
        for (handle, descriptor) in self.ctx.registry.entries().await {
            match handle.delete_user(identifier).await {
                Ok(()) => return Ok(Some(descriptor.id)),
                Err(e) => {
                    log::debug!("[{}] Delete by id '{identifier}' failed: {e}", descriptor.id);
                }
            }

            match handle.lookup_by_name(identifier).await {
                Ok(Some(user)) => {
                    if let Err(e) = handle.delete_user(&user.id).await {
                        log::warn!(
                            "[{}] Found '{identifier}' as {} but delete failed: {e}",
                            descriptor.id,
                            user.id
                        );
                        continue;
                    }
                    return Ok(Some(descriptor.id));
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("[{}] Lookup '{identifier}' failed: {e}", descriptor.id);
                }
            }
        }
        Ok(None)
    }
}
