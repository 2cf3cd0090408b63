use serde::Serialize;

/// Result of one health probe against one backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    /// Whether the probe succeeded.
    pub healthy: bool,
    /// Probe round-trip time in milliseconds.
    pub latency_ms: u64,
    /// Failure reason, captured verbatim.
    pub error: Option<String>,
    /// Number of remote accounts reported by a successful probe.
    pub user_count: Option<usize>,
}

impl BackendHealth {
    pub(crate) fn healthy(latency_ms: u64, user_count: usize) -> Self {
        Self {
            healthy: true,
            latency_ms,
            error: None,
            user_count: Some(user_count),
        }
    }

    pub(crate) fn unhealthy(latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            latency_ms,
            error: Some(error.into()),
            user_count: None,
        }
    }
}

/// Last-known availability of a backend, tracked per monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthState {
    /// Not probed yet.
    Unknown,
    /// Last probe succeeded.
    Healthy,
    /// Last probe failed.
    Unhealthy,
}
