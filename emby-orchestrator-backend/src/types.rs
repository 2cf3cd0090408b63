//! Shared data types for the backend capability surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A freshly provisioned remote account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAccount {
    /// Remote account id assigned by the backend.
    pub account_id: String,
    /// Generated login password.
    pub password: String,
    /// Expiry computed from the granted duration.
    pub expires_at: DateTime<Utc>,
}

/// A user account as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Remote account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the account is currently disabled by policy.
    pub disabled: bool,
}

/// One item from a user's favorites list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    /// Item id on the backend.
    pub item_id: String,
    /// Display name of the item.
    pub item_name: String,
}
