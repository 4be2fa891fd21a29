//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Threshold table → Ground link → Buffers → Watchdog
//!
//! Teardown:
//!     Topology dropped → Buffers returned to the assembly allocator
//! ```
//!
//! # Design Decisions
//! - Ordered startup: thresholds first, watchdog last
//! - Allocation happens only here, never during steady-state operation

pub mod startup;

pub use startup::{assemble, assemble_with_responder, CommLink, StartupError, Topology, TopologySummary};
