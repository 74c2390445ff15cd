//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every call produces:
//!     → logging.rs (structured log events inside a per-call span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Call ID flows through every event of a call via its span
//! - Metrics are a no-op until a recorder is installed

pub mod logging;
pub mod metrics;
