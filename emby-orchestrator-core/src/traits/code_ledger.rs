//! Redemption ledger abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{EntitlementUpdate, RedeemCode};

/// An exclusive, uncommitted claim on one redemption code.
///
/// Produced by [`CodeLedger::begin`]: the underlying store transaction has
/// already marked the code consumed, but nothing is visible to other
/// transactions until [`commit`](Self::commit). Dropping a claim without
/// committing rolls the consumption back.
#[async_trait]
pub trait CodeClaim: Send {
    /// The claimed code's data, as selected under the claim.
    fn code(&self) -> &RedeemCode;

    /// Apply the entitlement update in the same transaction and commit.
    ///
    /// Either both the consumption and the update become durable, or —
    /// on any failure — neither does.
    async fn commit(self: Box<Self>, update: EntitlementUpdate) -> CoreResult<()>;

    /// Roll back; the code stays unconsumed.
    async fn abort(self: Box<Self>) -> CoreResult<()>;
}

/// Durable code → consumption-event ledger.
///
/// Exactly-once consumption is enforced by the store, not by in-process
/// locking: `begin` issues a conditional update ("set consumer where
/// consumer is unset") and decides the winner from the affected-row count.
#[async_trait]
pub trait CodeLedger: Send + Sync {
    /// Insert a freshly issued code.
    async fn insert(&self, code: &RedeemCode) -> CoreResult<()>;

    /// Look up a code without claiming it.
    async fn find(&self, code: &str) -> CoreResult<Option<RedeemCode>>;

    /// Claim a code for `redeemer`.
    ///
    /// Errors: `CodeNotFound` if no such code exists, `CodeAlreadyUsed`
    /// (carrying the winner's identity) if the conditional update affected
    /// zero rows.
    async fn begin(&self, code: &str, redeemer: i64) -> CoreResult<Box<dyn CodeClaim>>;
}
