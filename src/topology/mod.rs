//! Static topology data for the reference deployment.
//!
//! # Data Flow
//! ```text
//! allocation.rs (MALLOCATOR)
//!     → state.rs (EndpointConfig per network-facing component)
//!     → ping.rs (PingThresholdTable, keyed by components.rs)
//!     → health::watchdog (copies thresholds at construction)
//! ```
//!
//! # Design Decisions
//! - Everything here is immutable once the assembly phase is over
//! - Thresholds are keyed by a closed enumeration so coverage is checkable
//!   at compile time for the built-in table and at startup for loaded ones
//! - The allocator is a capability trait, not a global, so assembly can run
//!   against a bounded or failing allocator

pub mod allocation;
pub mod components;
pub mod ping;
pub mod state;

pub use allocation::{AssemblyAllocator, MallocAllocator, MALLOCATOR};
pub use components::ComponentId;
pub use ping::{PingEntry, PingThresholdTable, ThresholdError, RPI_PING_TABLE};
pub use state::EndpointConfig;
