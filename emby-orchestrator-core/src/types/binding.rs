use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's account on one specific backend.
///
/// At most one binding exists per (user, backend) pair, and at most one of a
/// user's bindings carries `is_primary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Local user id.
    pub user_id: i64,
    /// Backend the account lives on.
    pub backend_id: String,
    /// Account id on that backend; non-empty while the binding is enabled.
    pub remote_account_id: String,
    /// Whether this backend is the user's default.
    pub is_primary: bool,
    /// Disabled bindings are kept for bookkeeping but excluded from fan-outs.
    pub enabled: bool,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

impl Binding {
    /// New enabled binding created now.
    #[must_use]
    pub fn new(
        user_id: i64,
        backend_id: impl Into<String>,
        remote_account_id: impl Into<String>,
        is_primary: bool,
    ) -> Self {
        Self {
            user_id,
            backend_id: backend_id.into(),
            remote_account_id: remote_account_id.into(),
            is_primary,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}
