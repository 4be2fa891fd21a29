//! Endpoint configuration handed to network-facing components during assembly.

use std::borrow::Cow;
use serde::{Deserialize, Serialize};

/// A network destination (host + port).
///
/// The default value is the "unconfigured" sentinel: empty host, port 0.
/// Construction never validates; the component that opens the connection
/// decides what a given host/port pair means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Host name or address literal.
    pub host_name: Cow<'static, str>,

    /// Port number.
    pub port_number: u32,
}

impl EndpointConfig {
    /// Create an endpoint from a host and port, stored verbatim.
    pub fn new(host_name: impl Into<Cow<'static, str>>, port_number: u32) -> Self {
        Self {
            host_name: host_name.into(),
            port_number,
        }
    }

    /// Create an endpoint in `const`/`static` context.
    pub const fn from_static(host_name: &'static str, port_number: u32) -> Self {
        Self {
            host_name: Cow::Borrowed(host_name),
            port_number,
        }
    }

    /// The unconfigured sentinel.
    pub const fn unconfigured() -> Self {
        Self::from_static("", 0)
    }

    /// Returns true if a host was supplied.
    pub fn is_configured(&self) -> bool {
        !self.host_name.is_empty()
    }
}
