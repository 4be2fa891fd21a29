//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! topology file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → TopologyConfig (validated, immutable)
//!     → lifecycle::startup (assembly phase)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; thresholds are fixed for the process lifetime
//! - All fields have defaults; an empty file describes the reference deployment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AssemblyConfig, ObservabilityConfig, TopologyConfig, WarnPolicy, WatchdogConfig};
pub use validation::{validate_config, ValidationError};
