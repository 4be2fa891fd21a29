//! Ping watchdog.
//!
//! # Responsibilities
//! - Own the live consecutive-miss counter of every supervised component
//! - Classify ping results against the thresholds copied at construction
//! - Emit warning/fatal signals and escalate fatal ones
//!
//! The ping driver (cadence, timeouts) is outside this module: it reports one
//! [`PingOutcome`] per component per cycle through [`Watchdog::record`] or
//! [`Watchdog::run_cycle`].

use strum::EnumCount;
use thiserror::Error;

use crate::config::schema::WatchdogConfig;
use crate::health::escalation::FaultResponder;
use crate::health::state::{ComponentHealth, HealthSignal, PingOutcome, SupervisedState, WarnPolicy};
use crate::observability::metrics;
use crate::topology::{ComponentId, PingEntry, PingThresholdTable, ThresholdError};

/// Misuse of a constructed watchdog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchdogError {
    #[error("component {0} is not supervised by the watchdog")]
    NotSupervised(ComponentId),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}

/// Applies ping thresholds to live miss counters.
pub struct Watchdog {
    states: [Option<SupervisedState>; ComponentId::COUNT],
    policy: WarnPolicy,
    responder: Box<dyn FaultResponder>,
}

impl Watchdog {
    /// Create a watchdog supervising `supervised`.
    ///
    /// Thresholds are read from `table` once, here. Every supervised component
    /// must have a valid entry; all violations are reported together.
    pub fn new(
        table: &PingThresholdTable,
        supervised: &[ComponentId],
        config: &WatchdogConfig,
        responder: Box<dyn FaultResponder>,
    ) -> Result<Self, Vec<ThresholdError>> {
        let mut states: [Option<SupervisedState>; ComponentId::COUNT] = std::array::from_fn(|_| None);
        let mut errors = Vec::new();

        for &component in supervised {
            match table
                .thresholds_for(component)
                .and_then(|entry| entry.validate(component).map(|_| entry))
            {
                Ok(entry) => states[component.index()] = Some(SupervisedState::new(entry)),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        tracing::info!(
            supervised = supervised.len(),
            policy = %config.warn_policy,
            "Watchdog initialized"
        );

        Ok(Self {
            states,
            policy: config.warn_policy,
            responder,
        })
    }

    /// Create a watchdog for every supervised instance of the deployment.
    pub fn for_deployment(
        table: &PingThresholdTable,
        config: &WatchdogConfig,
        responder: Box<dyn FaultResponder>,
    ) -> Result<Self, Vec<ThresholdError>> {
        Self::new(table, &ComponentId::SUPERVISED, config, responder)
    }

    pub fn policy(&self) -> WarnPolicy {
        self.policy
    }

    /// Supervised components in component order.
    pub fn supervised(&self) -> impl Iterator<Item = ComponentId> + '_ {
        use strum::IntoEnumIterator;
        ComponentId::iter().filter(|id| self.states[id.index()].is_some())
    }

    /// Record one ping result and return the signals it produced, warning first.
    pub fn record(
        &mut self,
        component: ComponentId,
        outcome: PingOutcome,
    ) -> Result<Vec<HealthSignal>, WatchdogError> {
        let policy = self.policy;
        let state = self.state_mut(component)?;
        let mut signals = Vec::new();

        match outcome {
            PingOutcome::Responded => {
                let previous = state.health();
                if let Some(misses) = state.mark_response() {
                    if previous != ComponentHealth::Nominal {
                        tracing::info!(component = %component, misses, from = %previous, "Component responding again");
                    } else {
                        tracing::debug!(component = %component, misses, "Miss streak ended");
                    }
                }
                metrics::record_consecutive_misses(component, 0);
            }
            PingOutcome::Missed => {
                let crossed = state.mark_miss(policy);
                let misses = state.consecutive_misses();
                let thresholds = state.thresholds();
                metrics::record_consecutive_misses(component, misses);

                if crossed.warn {
                    tracing::warn!(
                        component = %component,
                        misses,
                        warn = thresholds.warn,
                        fatal = thresholds.fatal,
                        "Ping warning threshold reached"
                    );
                    signals.push(HealthSignal::Warning { component, misses });
                }

                if crossed.fatal {
                    tracing::error!(
                        component = %component,
                        misses,
                        fatal = thresholds.fatal,
                        "Ping fatal threshold reached"
                    );
                    signals.push(HealthSignal::Fatal { component, misses });
                    self.responder.on_fatal(component, misses);
                }
            }
        }

        for signal in &signals {
            metrics::record_health_signal(signal);
        }

        Ok(signals)
    }

    /// Record a whole cycle of results.
    ///
    /// Every component is checked before any result is applied, so an
    /// unsupervised id leaves all counters untouched.
    pub fn run_cycle<I>(&mut self, outcomes: I) -> Result<Vec<HealthSignal>, WatchdogError>
    where
        I: IntoIterator<Item = (ComponentId, PingOutcome)>,
    {
        let outcomes: Vec<_> = outcomes.into_iter().collect();
        if let Some((component, _)) = outcomes.iter().find(|(id, _)| self.states[id.index()].is_none()) {
            return Err(WatchdogError::NotSupervised(*component));
        }

        let mut signals = Vec::new();
        for (component, outcome) in outcomes {
            signals.extend(self.record(component, outcome)?);
        }
        Ok(signals)
    }

    /// Switch supervision of one component on or off.
    pub fn set_enabled(&mut self, component: ComponentId, enabled: bool) -> Result<(), WatchdogError> {
        let state = self.state_mut(component)?;
        state.set_enabled(enabled);
        tracing::info!(component = %component, enabled, "Ping supervision toggled");
        Ok(())
    }

    /// Override the cached thresholds of one component.
    ///
    /// The static table is unaffected; the live counter is kept and the
    /// warning/fatal flags follow `SupervisedState::set_thresholds`.
    pub fn change_thresholds(&mut self, component: ComponentId, entry: PingEntry) -> Result<(), WatchdogError> {
        entry.validate(component)?;
        let state = self.state_mut(component)?;
        let previous = state.thresholds();
        state.set_thresholds(entry);
        tracing::info!(
            component = %component,
            old_warn = previous.warn,
            old_fatal = previous.fatal,
            warn = entry.warn,
            fatal = entry.fatal,
            "Ping thresholds changed"
        );
        Ok(())
    }

    pub fn health_of(&self, component: ComponentId) -> Result<ComponentHealth, WatchdogError> {
        self.state(component).map(SupervisedState::health)
    }

    pub fn consecutive_misses(&self, component: ComponentId) -> Result<u32, WatchdogError> {
        self.state(component).map(SupervisedState::consecutive_misses)
    }

    pub fn thresholds(&self, component: ComponentId) -> Result<PingEntry, WatchdogError> {
        self.state(component).map(SupervisedState::thresholds)
    }

    /// Returns true if no enabled component is in warning or failed state.
    pub fn all_nominal(&self) -> bool {
        self.states
            .iter()
            .flatten()
            .all(|s| matches!(s.health(), ComponentHealth::Nominal | ComponentHealth::Disabled))
    }

    fn state(&self, component: ComponentId) -> Result<&SupervisedState, WatchdogError> {
        self.states[component.index()]
            .as_ref()
            .ok_or(WatchdogError::NotSupervised(component))
    }

    fn state_mut(&mut self, component: ComponentId) -> Result<&mut SupervisedState, WatchdogError> {
        self.states[component.index()]
            .as_mut()
            .ok_or(WatchdogError::NotSupervised(component))
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("policy", &self.policy)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}
