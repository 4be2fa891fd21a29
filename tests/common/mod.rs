//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rpi_topology::config::WatchdogConfig;
use rpi_topology::health::{FaultResponder, Watchdog};
use rpi_topology::topology::allocation::{AllocationError, AssemblyAllocator, Block};
use rpi_topology::topology::{ComponentId, PingEntry, PingThresholdTable, MALLOCATOR};

/// Escalations seen by a recording responder.
pub type Escalations = Arc<Mutex<Vec<(ComponentId, u32)>>>;

/// A responder that records every escalation.
#[allow(dead_code)]
pub fn recording_responder() -> (Box<dyn FaultResponder>, Escalations) {
    let escalations: Escalations = Arc::new(Mutex::new(Vec::new()));
    let sink = escalations.clone();
    let responder: Box<dyn FaultResponder> = Box::new(move |component: ComponentId, misses: u32| {
        sink.lock().unwrap().push((component, misses));
    });
    (responder, escalations)
}

/// A watchdog supervising a single component with synthetic thresholds.
#[allow(dead_code)]
pub fn single_watchdog(
    component: ComponentId,
    entry: PingEntry,
    config: &WatchdogConfig,
) -> (Watchdog, Escalations) {
    let table = PingThresholdTable::empty().with(component, entry);
    let (responder, escalations) = recording_responder();
    let watchdog = Watchdog::new(&table, &[component], config, responder).unwrap();
    (watchdog, escalations)
}

/// Allocator that fails for one memory identifier and tracks outstanding blocks.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FailingAllocator {
    pub fail_identifier: Option<u32>,
    pub outstanding: AtomicUsize,
    pub allocations: AtomicUsize,
}

#[allow(dead_code)]
impl FailingAllocator {
    pub fn failing_on(identifier: u32) -> Self {
        Self {
            fail_identifier: Some(identifier),
            ..Self::default()
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl AssemblyAllocator for FailingAllocator {
    fn allocate(&self, identifier: u32, size: usize) -> Result<Block, AllocationError> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        if self.fail_identifier == Some(identifier) {
            return Err(AllocationError::Exhausted { identifier, size });
        }
        let block = MALLOCATOR.allocate(identifier, size)?;
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(block)
    }

    fn deallocate(&self, identifier: u32, block: Block) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        MALLOCATOR.deallocate(identifier, block);
    }
}
