//! Resilience primitives for service clients.
//!
//! - [`HealthAdvisor`]: failure-threshold tracker with a cooldown window
//! - [`BackoffRetryExecutor`]: retries a fallible operation with capped exponential backoff

pub mod clock;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ResilienceConfig;
pub use health::{AdvisorRegistry, HealthAdvisor, HealthHooks, SharedHealthAdvisor};
pub use lifecycle::Shutdown;
pub use resilience::{BackoffRetryExecutor, RetryPolicy};
