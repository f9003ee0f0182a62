//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! SIGINT (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → BackoffRetryExecutor::execute_until_shutdown returns Cancelled
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
