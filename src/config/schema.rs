//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the resilience
//! primitives. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Default health advisor settings, applied to every resource without an override.
    pub health: HealthConfig,

    /// Backoff retry policy.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Named resources with optional per-resource health settings.
    pub resources: Vec<ResourceConfig>,
}

impl ResilienceConfig {
    /// Health settings for `name`, falling back to the defaults.
    pub fn health_for(&self, name: &str) -> &HealthConfig {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.health.as_ref())
            .unwrap_or(&self.health)
    }
}

/// Health advisor configuration.
///
/// Signed on purpose: non-positive values are accepted and normalized to the
/// advisor defaults instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Consecutive failures before the resource is reported unhealthy.
    pub max_failure_count: i64,

    /// Cooldown length in seconds.
    pub unhealthy_duration_secs: i64,

    /// Whether failures while unhealthy restart the cooldown and keep the count.
    pub extend_duration_on_immediate_failure: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_failure_count: 3,
            unhealthy_duration_secs: 60,
            extend_duration_on_immediate_failure: false,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds (0 disables waiting).
    pub initial_backoff_ms: u64,

    /// Delay cap in milliseconds (0 leaves growth uncapped).
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A monitored resource.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Resource identifier for logging/metrics.
    pub name: String,

    /// Per-resource health settings; the root `[health]` table applies when absent.
    #[serde(default)]
    pub health: Option<HealthConfig>,
}
