//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Assembly and watchdog produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (miss-counter gauges, signal counters)
//!
//! Consumers:
//!     → stdout (human-readable or JSON lines)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (component, misses, thresholds) on every supervision event
//! - Metrics go through the `metrics` facade; no exporter is installed here

pub mod logging;
pub mod metrics;
