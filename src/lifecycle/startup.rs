//! Startup orchestration (assembly phase).
//!
//! # Responsibilities
//! - Turn validated configuration into the immutable threshold table
//! - Interpret the ground-link endpoint for the comm driver
//! - Allocate the deployment's fixed buffers through the assembly allocator
//! - Construct the watchdog for every supervised component
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in dependency order, single-threaded
//! - Buffers already allocated are returned if a later step fails

use serde::Serialize;
use thiserror::Error;

use crate::config::validation::ping_table;
use crate::config::TopologyConfig;
use crate::health::{FaultResponder, LoggingResponder, WarnPolicy, Watchdog};
use crate::topology::allocation::{AllocationError, AssemblyAllocator, Block};
use crate::topology::{EndpointConfig, PingThresholdTable, ThresholdError};

/// A fixed buffer region allocated during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBin {
    /// Owning instance.
    pub name: &'static str,
    /// Memory identifier passed to the allocator.
    pub identifier: u32,
    pub buffer_size: usize,
    pub count: usize,
}

impl BufferBin {
    pub const fn total_bytes(&self) -> usize {
        self.buffer_size * self.count
    }
}

/// Buffers of the reference deployment.
pub const BUFFER_BINS: [BufferBin; 2] = [
    BufferBin {
        name: "fileUplinkBufferManager",
        identifier: 200,
        buffer_size: 3000,
        count: 30,
    },
    BufferBin {
        name: "commFramePool",
        identifier: 201,
        buffer_size: 1024,
        count: 10,
    },
];

/// Bytes the reference deployment allocates during assembly.
pub const fn required_assembly_bytes() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < BUFFER_BINS.len() {
        total += BUFFER_BINS[i].total_bytes();
        i += 1;
    }
    total
}

/// Errors that abort the assembly phase.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("ping threshold configuration rejected: {}", join_errors(.0))]
    Thresholds(Vec<ThresholdError>),

    #[error("invalid ground-link endpoint {host}:{port}: {reason}")]
    InvalidEndpoint {
        host: String,
        port: u32,
        reason: &'static str,
    },

    #[error("assembly allocation failed: {0}")]
    Allocation(#[from] AllocationError),
}

fn join_errors(errors: &[ThresholdError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolved ground-link destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommLink {
    pub host: String,
    pub port: u16,
}

impl CommLink {
    /// Interpret an endpoint for connecting.
    ///
    /// An unconfigured endpoint means the link stays closed (`Ok(None)`).
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Option<Self>, StartupError> {
        if !endpoint.is_configured() {
            if endpoint.port_number != 0 {
                tracing::warn!(port = endpoint.port_number, "Port given without host, ground link disabled");
            }
            return Ok(None);
        }

        let invalid = |reason| StartupError::InvalidEndpoint {
            host: endpoint.host_name.to_string(),
            port: endpoint.port_number,
            reason,
        };

        if endpoint.port_number == 0 {
            return Err(invalid("port 0 cannot be connected to"));
        }
        let port = u16::try_from(endpoint.port_number).map_err(|_| invalid("port out of range"))?;

        Ok(Some(Self {
            host: endpoint.host_name.to_string(),
            port,
        }))
    }
}

/// Result of the assembly phase.
///
/// Owns the allocated buffers and returns them to the allocator on drop.
pub struct Topology<'a> {
    allocator: &'a dyn AssemblyAllocator,
    buffers: Vec<(BufferBin, Block)>,
    comm: Option<CommLink>,
    table: PingThresholdTable,
    watchdog: Watchdog,
}

/// Printable overview of an assembled topology.
#[derive(Debug, Clone, Serialize)]
pub struct TopologySummary {
    pub comm: Option<CommLink>,
    pub allocated_bytes: usize,
    pub buffer_bins: usize,
    pub supervised: usize,
    pub warn_policy: WarnPolicy,
}

impl<'a> Topology<'a> {
    pub fn comm(&self) -> Option<&CommLink> {
        self.comm.as_ref()
    }

    pub fn ping_table(&self) -> &PingThresholdTable {
        &self.table
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn watchdog_mut(&mut self) -> &mut Watchdog {
        &mut self.watchdog
    }

    /// Buffer region allocated for the bin with memory id `identifier`.
    pub fn buffer(&self, identifier: u32) -> Option<&Block> {
        self.buffers
            .iter()
            .find(|(bin, _)| bin.identifier == identifier)
            .map(|(_, block)| block)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.buffers.iter().map(|(_, block)| block.len()).sum()
    }

    pub fn summary(&self) -> TopologySummary {
        TopologySummary {
            comm: self.comm.clone(),
            allocated_bytes: self.allocated_bytes(),
            buffer_bins: self.buffers.len(),
            supervised: self.watchdog.supervised().count(),
            warn_policy: self.watchdog.policy(),
        }
    }
}

impl Drop for Topology<'_> {
    fn drop(&mut self) {
        release(self.allocator, &mut self.buffers);
        tracing::debug!("Topology torn down");
    }
}

fn release(allocator: &dyn AssemblyAllocator, buffers: &mut Vec<(BufferBin, Block)>) {
    for (bin, block) in buffers.drain(..).rev() {
        allocator.deallocate(bin.identifier, block);
    }
}

/// Run the assembly phase with the default (logging) fault responder.
pub fn assemble<'a>(
    config: &TopologyConfig,
    allocator: &'a dyn AssemblyAllocator,
) -> Result<Topology<'a>, StartupError> {
    assemble_with_responder(config, allocator, Box::new(LoggingResponder))
}

/// Run the assembly phase, escalating fatal ping failures to `responder`.
pub fn assemble_with_responder<'a>(
    config: &TopologyConfig,
    allocator: &'a dyn AssemblyAllocator,
    responder: Box<dyn FaultResponder>,
) -> Result<Topology<'a>, StartupError> {
    // 1. Thresholds
    let table = ping_table(config).map_err(StartupError::Thresholds)?;
    tracing::info!(entries = table.len(), "Ping threshold table built");

    // 2. Ground link
    let comm = CommLink::from_endpoint(&config.endpoint)?;
    match &comm {
        Some(link) => tracing::info!(host = %link.host, port = link.port, "Ground link configured"),
        None => tracing::info!("No ground link configured"),
    }

    // 3. Buffers
    let mut buffers = Vec::with_capacity(BUFFER_BINS.len());
    for bin in BUFFER_BINS {
        match allocator.allocate(bin.identifier, bin.total_bytes()) {
            Ok(block) => {
                tracing::debug!(name = bin.name, identifier = bin.identifier, bytes = block.len(), "Buffer bin allocated");
                buffers.push((bin, block));
            }
            Err(e) => {
                tracing::error!(name = bin.name, error = %e, "Assembly allocation failed");
                release(allocator, &mut buffers);
                return Err(e.into());
            }
        }
    }

    // 4. Watchdog
    let watchdog = match Watchdog::for_deployment(&table, &config.watchdog, responder) {
        Ok(watchdog) => watchdog,
        Err(errors) => {
            release(allocator, &mut buffers);
            return Err(StartupError::Thresholds(errors));
        }
    };

    let topology = Topology {
        allocator,
        buffers,
        comm,
        table,
        watchdog,
    };

    tracing::info!(
        allocated_bytes = topology.allocated_bytes(),
        supervised = topology.watchdog.supervised().count(),
        "Topology assembled"
    );

    Ok(topology)
}
