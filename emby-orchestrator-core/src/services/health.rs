//! Fleet health probing with edge-triggered alerting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::RwLock;

use crate::services::ServiceContext;
use crate::traits::AlertSink;
use crate::types::{BackendHealth, HealthState};

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;

/// Probes every registered backend and raises alerts on state transitions.
///
/// Alerting is edge-triggered: a backend that stays down across sweeps
/// produces one alert when it goes down and one recovery notice when it
/// comes back, never a message per sweep.
pub struct HealthMonitor {
    ctx: Arc<ServiceContext>,
    alerts: Arc<dyn AlertSink>,
    states: RwLock<HashMap<String, HealthState>>,
    probe_timeout: Duration,
}

impl HealthMonitor {
    /// Create a monitor with the default per-probe timeout.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, alerts: Arc<dyn AlertSink>) -> Self {
        Self::with_timeout(ctx, alerts, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS))
    }

    /// Create a monitor with a custom per-probe timeout.
    #[must_use]
    pub fn with_timeout(
        ctx: Arc<ServiceContext>,
        alerts: Arc<dyn AlertSink>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            ctx,
            alerts,
            states: RwLock::new(HashMap::new()),
            probe_timeout,
        }
    }

    /// Probe every registered backend concurrently.
    ///
    /// Always returns one entry per backend; a probe failure becomes an
    /// unhealthy entry rather than an error.
    pub async fn check_all(&self) -> Vec<(String, BackendHealth)> {
        let entries = self.ctx.registry.entries().await;
        let timeout = self.probe_timeout;

        let probes = entries.into_iter().map(|(handle, descriptor)| async move {
            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, handle.list_users()).await;
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let health = match outcome {
                Ok(Ok(users)) => BackendHealth::healthy(latency_ms, users.len()),
                Ok(Err(e)) => BackendHealth::unhealthy(latency_ms, e.to_string()),
                Err(_) => BackendHealth::unhealthy(
                    latency_ms,
                    format!("probe timed out after {}s", timeout.as_secs()),
                ),
            };
            (descriptor.id, health)
        });

        join_all(probes).await
    }

    /// One scheduled sweep: probe the fleet and alert on state transitions.
    ///
    /// Transitions are aggregated into at most one down alert and one
    /// recovery notice per sweep. Alert delivery failures are logged, never
    /// propagated; a broken sink must not stop the monitoring loop.
    pub async fn run_scheduled(&self) -> Vec<(String, BackendHealth)> {
        let report = self.check_all().await;
        let mut went_down = Vec::new();
        let mut recovered = Vec::new();

        {
            let mut states = self.states.write().await;
            for (backend_id, health) in &report {
                let previous = states
                    .get(backend_id)
                    .copied()
                    .unwrap_or(HealthState::Unknown);
                let current = if health.healthy {
                    HealthState::Healthy
                } else {
                    HealthState::Unhealthy
                };
                states.insert(backend_id.clone(), current);

                match (previous, current) {
                    (HealthState::Healthy | HealthState::Unknown, HealthState::Unhealthy) => {
                        let reason = health.error.as_deref().unwrap_or("unknown error");
                        log::warn!("[{backend_id}] Backend went down: {reason}");
                        went_down.push(format!("{backend_id}: {reason}"));
                    }
                    (HealthState::Unhealthy, HealthState::Healthy) => {
                        log::info!("[{backend_id}] Backend recovered ({}ms)", health.latency_ms);
                        recovered.push(backend_id.clone());
                    }
                    _ => {}
                }
            }
        }

        if !went_down.is_empty() {
            self.notify(&format!("Backend(s) DOWN:\n{}", went_down.join("\n")))
                .await;
        }
        if !recovered.is_empty() {
            self.notify(&format!("Backend(s) recovered: {}", recovered.join(", ")))
                .await;
        }

        report
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.alerts.send(message).await {
            log::error!("Failed to deliver alert: {e}");
        }
    }

    /// Last known state for a backend, `Unknown` before the first sweep.
    pub async fn state(&self, backend_id: &str) -> HealthState {
        self.states
            .read()
            .await
            .get(backend_id)
            .copied()
            .unwrap_or(HealthState::Unknown)
    }
}
