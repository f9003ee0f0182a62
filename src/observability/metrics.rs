//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_health_transitions_total` (counter): transitions by resource, target state
//! - `resilience_resource_health` (gauge): 1=healthy, 0=unhealthy
//! - `resilience_retry_attempts_total` (counter): attempt outcomes
//! - `resilience_backoff_seconds` (histogram): waits between attempts
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until a recorder is installed
//! - Prometheus exporter is opt-in

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::health::HealthState;

/// Outcome of one attempt inside the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Success,
    Retry,
    Exhausted,
    Rejected,
}

impl RetryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryOutcome::Success => "success",
            RetryOutcome::Retry => "retry",
            RetryOutcome::Exhausted => "exhausted",
            RetryOutcome::Rejected => "rejected",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_health_transition(resource: &str, to: HealthState) {
    counter!(
        "resilience_health_transitions_total",
        "resource" => resource.to_string(),
        "to" => to.as_str()
    )
    .increment(1);

    let value = match to {
        HealthState::Healthy => 1.0,
        HealthState::Unhealthy => 0.0,
    };
    gauge!("resilience_resource_health", "resource" => resource.to_string()).set(value);
}

pub fn record_retry_attempt(outcome: RetryOutcome) {
    counter!("resilience_retry_attempts_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_backoff(delay: Duration) {
    histogram!("resilience_backoff_seconds").record(delay.as_secs_f64());
}
