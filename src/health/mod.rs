//! Health advisory subsystem.
//!
//! # Data Flow
//! ```text
//! Caller, before a call:
//!     → advisor.rs is_healthy() (lazy cooldown expiry)
//!     → short-circuit when false
//!
//! Caller, after a call:
//!     → record_success() / record_failure()
//!     → state.rs transitions, hooks.rs side effects
//!
//! Many resources:
//!     → registry.rs (one shared.rs handle per name)
//! ```
//!
//! # Design Decisions
//! - The advisor never checks a resource itself; it only records reported outcomes
//! - Health state is per-resource, not global
//! - Single-owner core type, mutex wrapper for sharing

pub mod advisor;
pub mod hooks;
pub mod registry;
pub mod shared;
pub mod state;

pub use advisor::{AdvisorSettings, HealthAdvisor, DEFAULT_MAX_FAILURE_COUNT, DEFAULT_UNHEALTHY_DURATION};
pub use hooks::HealthHooks;
pub use registry::AdvisorRegistry;
pub use shared::SharedHealthAdvisor;
pub use state::{HealthState, ResourceHealth};
