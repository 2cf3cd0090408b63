use serde::{Deserialize, Serialize};

/// Unified error type for all media backend operations.
///
/// Each variant carries a `backend` field identifying which backend produced
/// the error, plus variant-specific context. All variants are serializable
/// for structured error reporting.
///
/// # Retryable errors
///
/// [`NetworkError`](Self::NetworkError) and [`Timeout`](Self::Timeout) are
/// transient and are retried automatically by the built-in HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum BackendError {
    /// A network-level error occurred (DNS failure, connection refused, etc.).
    NetworkError {
        /// Backend that produced the error.
        backend: String,
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Backend that produced the error.
        backend: String,
        /// Error details.
        detail: String,
    },

    /// The configured API key was rejected (HTTP 401/403).
    InvalidApiKey {
        /// Backend that produced the error.
        backend: String,
    },

    /// The referenced remote account does not exist on the backend.
    UserNotFound {
        /// Backend that produced the error.
        backend: String,
        /// Remote account id that was not found.
        account_id: String,
    },

    /// The backend API returned an unexpected status code.
    ApiError {
        /// Backend that produced the error.
        backend: String,
        /// HTTP status code.
        status: u16,
        /// Response body or error description.
        detail: String,
    },

    /// The backend response could not be parsed.
    ParseError {
        /// Backend that produced the error.
        backend: String,
        /// Parse error details.
        detail: String,
    },
}

impl BackendError {
    /// Whether the error is transient and the call may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }

    /// Backend id the error originated from.
    #[must_use]
    pub fn backend(&self) -> &str {
        match self {
            Self::NetworkError { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::InvalidApiKey { backend }
            | Self::UserNotFound { backend, .. }
            | Self::ApiError { backend, .. }
            | Self::ParseError { backend, .. } => backend,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { backend, detail } => {
                write!(f, "[{backend}] Network error: {detail}")
            }
            Self::Timeout { backend, detail } => {
                write!(f, "[{backend}] Request timeout: {detail}")
            }
            Self::InvalidApiKey { backend } => {
                write!(f, "[{backend}] Invalid API key")
            }
            Self::UserNotFound {
                backend,
                account_id,
            } => {
                write!(f, "[{backend}] User '{account_id}' not found")
            }
            Self::ApiError {
                backend,
                status,
                detail,
            } => {
                write!(f, "[{backend}] API error (HTTP {status}): {detail}")
            }
            Self::ParseError { backend, detail } => {
                write!(f, "[{backend}] Parse error: {detail}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Result alias used throughout the backend crate.
pub type Result<T> = std::result::Result<T, BackendError>;
