//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client, connector and codec produce:
//!     → logging.rs (subscriber setup for structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log output (stderr, filtered by RUST_LOG)
//!     → Whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Connection ID flows through connection-level log events
//! - Metrics are no-ops until the embedding application installs a recorder
//! - Logging is never initialized by the library itself

pub mod logging;
pub mod metrics;
