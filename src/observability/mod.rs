//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Route loader and dispatcher produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! The hosting layer adds:
//!     → TraceLayer spans and an x-request-id per request
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request via the trace span
//! - Metrics are cheap (atomic increments) and off unless an exporter is installed

pub mod logging;
pub mod metrics;
