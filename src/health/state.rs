//! Health state and point-in-time views.
//!
//! # States
//! - Healthy: the resource may be called
//! - Unhealthy: the resource is cooling down; callers should short-circuit
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive failures >= max_failure_count
//! Unhealthy → Healthy: cooldown elapsed (observed on next is_healthy poll)
//! Unhealthy → Healthy: any success
//! ```

use serde::Serialize;
use std::time::Duration;

/// Recorded health state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Read-only view of an advisor, taken without triggering transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHealth {
    pub name: String,
    pub state: HealthState,
    pub failure_count: u32,
    /// Time left in the cooldown; zero once elapsed but not yet observed.
    #[serde(serialize_with = "serialize_millis")]
    pub cooldown_remaining: Option<Duration>,
}

fn serialize_millis<S: serde::Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        None => s.serialize_none(),
    }
}
