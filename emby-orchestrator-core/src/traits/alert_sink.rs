//! Alert notification abstract trait.

use async_trait::async_trait;

use crate::error::CoreResult;

/// Destination for aggregated operational alerts.
///
/// The health monitor formats one message per sweep; delivery (chat message,
/// webhook, ...) is the implementation's concern. Send failures are logged
/// by the caller, never propagated into the monitoring path.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert message.
    async fn send(&self, message: &str) -> CoreResult<()>;
}
