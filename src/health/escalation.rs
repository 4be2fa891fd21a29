//! Escalation of fatal ping failures to the fault-recovery collaborator.

use crate::topology::ComponentId;

/// Receives fatal escalations from the watchdog.
///
/// Called once per failure episode, after the fatal signal was recorded.
/// The recovery action (restart, safe mode, ...) belongs to the implementor.
pub trait FaultResponder: Send {
    fn on_fatal(&mut self, component: ComponentId, misses: u32);
}

/// Responder that only logs the escalation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingResponder;

impl FaultResponder for LoggingResponder {
    fn on_fatal(&mut self, component: ComponentId, misses: u32) {
        tracing::error!(
            component = %component,
            misses,
            "Component failed ping supervision, escalating to fault handling"
        );
    }
}

impl<F> FaultResponder for F
where
    F: FnMut(ComponentId, u32) + Send,
{
    fn on_fatal(&mut self, component: ComponentId, misses: u32) {
        self(component, misses)
    }
}
