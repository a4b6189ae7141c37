//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and ad-hoc negotiation produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (outcome counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every negotiation log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
