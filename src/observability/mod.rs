//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! health / resilience produce:
//!     → tracing events (transitions at info/warn, attempts at debug)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
