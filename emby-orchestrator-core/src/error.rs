//! Unified error type definition.

use serde::Serialize;
use thiserror::Error;

use crate::types::TargetFailure;

// Re-export library error type
pub use emby_orchestrator_backend::BackendError;

/// Core layer error type.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Invalid backend configuration (bad descriptor, duplicate id).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// No live handle is registered for the backend.
    #[error("Backend unavailable: {backend} - {detail}")]
    BackendUnavailable {
        /// Backend id.
        backend: String,
        /// Why the backend could not be used.
        detail: String,
    },

    /// The redemption code does not exist.
    #[error("Code not found: {0}")]
    CodeNotFound(String),

    /// The redemption code was already consumed.
    #[error("Code already used: {code}")]
    CodeAlreadyUsed {
        /// The code in question.
        code: String,
        /// Who consumed it, when known.
        used_by: Option<i64>,
    },

    /// No local profile exists for the user.
    #[error("Profile not found for user {0}")]
    ProfileNotFound(i64),

    /// Renewal was attempted without any bound account.
    #[error("User {0} has no account to renew")]
    NoAccountToRenew(i64),

    /// Registration was attempted while an account already exists.
    #[error("User {0} already has an account")]
    AlreadyRegistered(i64),

    /// Registration code redeemed while unused credit remains.
    #[error("User {0} already holds unused registration credit")]
    AlreadyHasCredit(i64),

    /// Account creation from credit was attempted with no credit.
    #[error("User {0} has no registration credit")]
    NoRegistrationCredit(i64),

    /// No binding exists for the referenced (user, backend) pair.
    #[error("No binding found for user {user_id}{}", backend_id.as_ref().map(|b| format!(" on backend {b}")).unwrap_or_default())]
    BindingNotFound {
        /// User id.
        user_id: i64,
        /// Backend id, when the operation targeted a specific backend.
        backend_id: Option<String>,
    },

    /// A binding already exists for the (user, backend) pair.
    #[error("User {user_id} is already bound to backend {backend_id}")]
    BindingExists {
        /// User id.
        user_id: i64,
        /// Backend id.
        backend_id: String,
    },

    /// A fan-out succeeded on a strict subset of its targets.
    #[error("Operation failed on {} backend(s)", failures.len())]
    PartialFailure {
        /// Per-target failure table; retry only these.
        failures: Vec<TargetFailure>,
    },

    /// A fan-out failed on every target; local state was left untouched.
    #[error("Operation failed on all {} backend(s)", failures.len())]
    AllTargetsFailed {
        /// Per-target failure table.
        failures: Vec<TargetFailure>,
    },

    /// Storage layer error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Backend error (converted from the client library).
    #[error("{0}")]
    Backend(#[from] BackendError),
}

impl CoreError {
    /// Whether this is expected behavior (user input, resource absent, final
    /// outcomes) used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error`
    /// when returning `false`. **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::CodeNotFound(_)
            | Self::CodeAlreadyUsed { .. }
            | Self::ProfileNotFound(_)
            | Self::NoAccountToRenew(_)
            | Self::AlreadyRegistered(_)
            | Self::AlreadyHasCredit(_)
            | Self::NoRegistrationCredit(_)
            | Self::BindingNotFound { .. }
            | Self::BindingExists { .. }
            | Self::ConfigurationError(_) => true,
            Self::Backend(e) => matches!(
                e,
                BackendError::UserNotFound { .. } | BackendError::InvalidApiKey { .. }
            ),
            _ => false,
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// `CodeAlreadyUsed` is final and must never be retried with the same
    /// code; availability and partial-failure errors are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendUnavailable { .. }
            | Self::PartialFailure { .. }
            | Self::AllTargetsFailed { .. } => true,
            Self::Backend(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Core layer Result type alias.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
