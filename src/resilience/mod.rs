//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → guarded.rs (skip if the health advisor says unhealthy)
//!     → retries.rs (attempt, wait, attempt again)
//!     → backoff.rs (doubling delay, capped)
//!     → sleep.rs (blocking) or tokio::time::sleep (async)
//!     → guarded.rs (report final outcome to the advisor)
//! ```
//!
//! # Design Decisions
//! - Executor is stateless between calls
//! - No jitter; delays are deterministic
//! - Retryability is the caller's decision, all errors retry by default

pub mod backoff;
pub mod guarded;
pub mod retries;
pub mod sleep;

pub use backoff::Backoff;
pub use guarded::GuardedError;
pub use retries::{BackoffRetryExecutor, RetryError, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use sleep::{Sleeper, ThreadSleeper};
