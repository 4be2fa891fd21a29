//! Ping supervision.
//!
//! # Data Flow
//! ```text
//! Ping driver (external):
//!     one result per supervised component per cycle
//!     → watchdog.rs (Watchdog::record / run_cycle)
//!     → state.rs (consecutive-miss counter vs. cached thresholds)
//!     → HealthSignal::Warning / HealthSignal::Fatal
//!     → escalation.rs (FaultResponder, fatal only)
//! ```
//!
//! # Design Decisions
//! - Thresholds come from `topology::ping` and are copied once at construction
//! - A warning fires once per failure episode by default (`WarnPolicy`)
//! - Fatal is terminal for the episode; only a response starts a new one
//! - Counters are per-component, owned exclusively by the watchdog

pub mod escalation;
pub mod state;
pub mod watchdog;

pub use escalation::{FaultResponder, LoggingResponder};
pub use state::{ComponentHealth, HealthSignal, PingOutcome, Severity, WarnPolicy};
pub use watchdog::{Watchdog, WatchdogError};
