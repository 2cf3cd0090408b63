use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a redemption code grants when consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    /// Grants registration credit for creating a new account.
    Registration,
    /// Extends the expiry of an existing account.
    Renewal,
}

impl CodeKind {
    /// Stable string form used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Renewal => "renewal",
        }
    }

    /// Parse the persisted string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registration" => Some(Self::Registration),
            "renewal" => Some(Self::Renewal),
            _ => None,
        }
    }
}

/// A single-use entitlement certificate.
///
/// `consumed_by` is set at most once and is immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemCode {
    /// The code string itself; unique.
    pub code: String,
    /// User who issued the code.
    pub issuer: i64,
    /// Days of entitlement the code grants.
    pub duration_days: i64,
    /// Registration or renewal.
    pub kind: CodeKind,
    /// Consumer, once redeemed.
    pub consumed_by: Option<i64>,
    /// Consumption timestamp, once redeemed.
    pub consumed_at: Option<DateTime<Utc>>,
}

/// The local profile change committed together with a code consumption.
///
/// Applied by the ledger inside the same store transaction that marks the
/// code consumed, so neither effect is ever observed without the other.
#[derive(Debug, Clone, Serialize)]
pub enum EntitlementUpdate {
    /// Extend (or restart) the account expiry.
    Renewal {
        /// User whose profile is updated.
        user_id: i64,
        /// New expiry timestamp.
        new_expiry: DateTime<Utc>,
        /// Lift a suspension alongside the extension.
        reinstate: bool,
    },
    /// Add registration credit days.
    RegistrationCredit {
        /// User whose profile is updated.
        user_id: i64,
        /// Days of credit to add.
        days: i64,
    },
}

/// Outcome of a successful redemption, for the caller to render.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemGrant {
    /// Kind of the consumed code.
    pub kind: CodeKind,
    /// Who issued the code.
    pub issuer: i64,
    /// Days granted.
    pub days: i64,
    /// New expiry, for renewal grants.
    pub new_expiry: Option<DateTime<Utc>>,
    /// Whether a suspension was lifted as part of the grant.
    pub reinstated: bool,
}
