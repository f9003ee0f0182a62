//! Failure-threshold / cooldown tracker for a single resource.
//!
//! # Responsibilities
//! - Count consecutive failures reported by the caller
//! - Enter a cooldown window once the threshold is reached
//! - Detect cooldown expiry lazily on the next `is_healthy` poll
//! - Fire the configured hooks on each transition
//!
//! # Design Decisions
//! - No background timer; every transition is driven by a caller
//! - Time comes from an injected `Clock`
//! - Bad settings are normalized, never rejected

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{self, Clock, SystemClock};
use crate::config::HealthConfig;
use crate::health::hooks::HealthHooks;
use crate::health::state::{HealthState, ResourceHealth};
use crate::observability::metrics;

pub const DEFAULT_MAX_FAILURE_COUNT: u32 = 3;
pub const DEFAULT_UNHEALTHY_DURATION: Duration = Duration::from_secs(60);
/// Longest cooldown kept; larger values are clamped to it.
pub const MAX_UNHEALTHY_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Tuning for a [`HealthAdvisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisorSettings {
    pub max_failure_count: u32,
    pub unhealthy_duration: Duration,
    pub extend_duration_on_immediate_failure: bool,
}

impl AdvisorSettings {
    /// Replace zero values with the defaults and clamp the cooldown.
    pub fn normalized(self) -> Self {
        Self {
            max_failure_count: if self.max_failure_count == 0 {
                DEFAULT_MAX_FAILURE_COUNT
            } else {
                self.max_failure_count
            },
            unhealthy_duration: if self.unhealthy_duration.is_zero() {
                DEFAULT_UNHEALTHY_DURATION
            } else {
                self.unhealthy_duration.min(MAX_UNHEALTHY_DURATION)
            },
            extend_duration_on_immediate_failure: self.extend_duration_on_immediate_failure,
        }
    }
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            max_failure_count: DEFAULT_MAX_FAILURE_COUNT,
            unhealthy_duration: DEFAULT_UNHEALTHY_DURATION,
            extend_duration_on_immediate_failure: false,
        }
    }
}

impl From<&HealthConfig> for AdvisorSettings {
    fn from(config: &HealthConfig) -> Self {
        // Negative values collapse to zero and are normalized below.
        let max_failure_count = u32::try_from(config.max_failure_count.max(0)).unwrap_or(u32::MAX);
        let unhealthy_secs = u64::try_from(config.unhealthy_duration_secs.max(0)).unwrap_or(0);

        Self {
            max_failure_count,
            unhealthy_duration: Duration::from_secs(unhealthy_secs),
            extend_duration_on_immediate_failure: config.extend_duration_on_immediate_failure,
        }
        .normalized()
    }
}

/// Tracks the health of one resource from the outcomes its caller reports.
pub struct HealthAdvisor {
    name: Arc<str>,
    settings: AdvisorSettings,
    failure_count: u32,
    unhealthy_until: Option<Instant>,
    hooks: HealthHooks,
    clock: Arc<dyn Clock>,
}

impl HealthAdvisor {
    pub fn new(name: impl Into<Arc<str>>, settings: AdvisorSettings) -> Self {
        Self {
            name: name.into(),
            settings: settings.normalized(),
            failure_count: 0,
            unhealthy_until: None,
            hooks: HealthHooks::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_hooks(mut self, hooks: HealthHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Recorded state, without checking whether the cooldown has elapsed.
    pub fn state(&self) -> HealthState {
        if self.unhealthy_until.is_some() {
            HealthState::Unhealthy
        } else {
            HealthState::Healthy
        }
    }

    /// Whether the resource should be called right now.
    ///
    /// The first poll after the cooldown elapses performs the exit transition.
    pub fn is_healthy(&mut self) -> bool {
        let Some(until) = self.unhealthy_until else {
            return true;
        };

        if self.clock.now() < until {
            self.hooks.reported_unhealthy();
            return false;
        }

        self.unhealthy_until = None;
        if !self.settings.extend_duration_on_immediate_failure {
            self.failure_count = 0;
        }

        tracing::info!(
            resource = %self.name,
            failure_count = self.failure_count,
            "Cooldown elapsed, resource healthy again"
        );
        metrics::record_health_transition(&self.name, HealthState::Healthy);
        self.hooks.exited_unhealthy();
        true
    }

    /// Report a failed call against the resource.
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);

        if self.failure_count < self.settings.max_failure_count {
            tracing::debug!(
                resource = %self.name,
                failure_count = self.failure_count,
                threshold = self.settings.max_failure_count,
                "Failure recorded"
            );
            return;
        }

        let deadline = clock::saturating_add(self.clock.now(), self.settings.unhealthy_duration);
        let entering = self.unhealthy_until.replace(deadline).is_none();

        if entering {
            tracing::warn!(
                resource = %self.name,
                failure_count = self.failure_count,
                cooldown = ?self.settings.unhealthy_duration,
                "Failure threshold reached, resource marked unhealthy"
            );
            metrics::record_health_transition(&self.name, HealthState::Unhealthy);
            self.hooks.entered_unhealthy();
        }
    }

    /// Report a successful call against the resource.
    pub fn record_success(&mut self) {
        self.failure_count = 0;

        if self.unhealthy_until.take().is_some() {
            tracing::info!(resource = %self.name, "Success recorded, resource healthy again");
            metrics::record_health_transition(&self.name, HealthState::Healthy);
            self.hooks.exited_unhealthy();
        }
    }

    /// Point-in-time view; never fires hooks or transitions.
    pub fn snapshot(&self) -> ResourceHealth {
        let now = self.clock.now();
        ResourceHealth {
            name: self.name.to_string(),
            state: self.state(),
            failure_count: self.failure_count,
            cooldown_remaining: self.unhealthy_until.map(|until| until.saturating_duration_since(now)),
        }
    }
}

impl fmt::Debug for HealthAdvisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthAdvisor")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("failure_count", &self.failure_count)
            .field("unhealthy_until", &self.unhealthy_until)
            .field("hooks", &self.hooks)
            .finish()
    }
}
