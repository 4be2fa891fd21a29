//! Topology configuration and ping supervision for the RPI reference deployment.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod topology;

pub use config::schema::TopologyConfig;
pub use health::Watchdog;
pub use lifecycle::{assemble, Topology};
pub use topology::{ComponentId, EndpointConfig, PingEntry, PingThresholdTable};
