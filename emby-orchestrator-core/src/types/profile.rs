use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership level of a local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    /// Privileged member with access to dedicated lines.
    Whitelisted,
    /// Regular member.
    Standard,
    /// Suspended; remote accounts disabled by policy.
    Suspended,
    /// No account provisioned.
    Unregistered,
}

impl UserLevel {
    /// Stable string form used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whitelisted => "whitelisted",
            Self::Standard => "standard",
            Self::Suspended => "suspended",
            Self::Unregistered => "unregistered",
        }
    }

    /// Parse the persisted string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "whitelisted" => Some(Self::Whitelisted),
            "standard" => Some(Self::Standard),
            "suspended" => Some(Self::Suspended),
            "unregistered" => Some(Self::Unregistered),
            _ => None,
        }
    }
}

/// The local account record of one user.
///
/// Account fields mirror the user's primary backend account; the entitlement
/// fields (`level`, `expires_at`, `credit_days`) are owned by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Local user id.
    pub user_id: i64,
    /// Remote account id on the primary backend.
    pub account_id: Option<String>,
    /// Account display name.
    pub account_name: Option<String>,
    /// Generated account password.
    pub password: Option<String>,
    /// Membership level.
    pub level: UserLevel,
    /// Entitlement expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Unused registration credit, in days.
    pub credit_days: i64,
    /// When the account was provisioned.
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Fresh unregistered profile.
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            account_id: None,
            account_name: None,
            password: None,
            level: UserLevel::Unregistered,
            expires_at: None,
            credit_days: 0,
            created_at: None,
        }
    }

    /// Whether an account is currently attached.
    #[must_use]
    pub fn has_account(&self) -> bool {
        self.account_id.is_some()
    }

    /// Whether the entitlement has lapsed at `now`.
    ///
    /// An attached account without an expiry counts as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|ex| ex <= now)
    }
}

/// Account data attached to a profile after a successful remote creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Remote account id.
    pub account_id: String,
    /// Account display name.
    pub account_name: String,
    /// Generated password.
    pub password: String,
    /// Initial expiry.
    pub expires_at: DateTime<Utc>,
}
