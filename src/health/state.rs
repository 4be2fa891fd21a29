//! Per-component supervision state machine.
//!
//! # States
//! - Nominal: responding, or missed fewer than `warn` pings
//! - Warning: `warn` or more consecutive misses
//! - Failed: `fatal` or more consecutive misses; terminal for the episode
//! - Disabled: supervision switched off, nothing is counted
//!
//! # State Transitions
//! ```text
//! Nominal → Warning: consecutive misses >= warn
//! Warning → Failed:  consecutive misses >= fatal
//! any     → Nominal: ping response (counter reset, episode ends)
//! ```
//!
//! # Design Decisions
//! - Warning and fatal are evaluated in the same step, warning first, so
//!   `warn == fatal` produces both
//! - Once failed, further misses are counted but never signalled again

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::topology::{ComponentId, PingEntry};

/// Health classification of one supervised component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentHealth {
    Nominal,
    Warning,
    Failed,
    Disabled,
}

/// When a warning signal is repeated within one failure episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarnPolicy {
    /// Warn when the miss counter first reaches `warn`.
    #[default]
    OncePerEpisode,
    /// Warn on every miss at or above `warn` until fatal.
    EveryCycle,
}

/// Result of one ping cycle for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    Responded,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Warning,
    Fatal,
}

/// Signal emitted when a threshold is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSignal {
    Warning { component: ComponentId, misses: u32 },
    Fatal { component: ComponentId, misses: u32 },
}

impl HealthSignal {
    pub fn component(&self) -> ComponentId {
        match self {
            HealthSignal::Warning { component, .. } | HealthSignal::Fatal { component, .. } => *component,
        }
    }

    pub fn misses(&self) -> u32 {
        match self {
            HealthSignal::Warning { misses, .. } | HealthSignal::Fatal { misses, .. } => *misses,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            HealthSignal::Warning { .. } => Severity::Warning,
            HealthSignal::Fatal { .. } => Severity::Fatal,
        }
    }
}

/// Which thresholds a single miss crossed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissOutcome {
    pub warn: bool,
    pub fatal: bool,
}

/// Live supervision state for one component.
#[derive(Debug, Clone)]
pub struct SupervisedState {
    thresholds: PingEntry,
    misses: u32,
    warned: bool,
    failed: bool,
    enabled: bool,
}

impl SupervisedState {
    pub fn new(thresholds: PingEntry) -> Self {
        Self {
            thresholds,
            misses: 0,
            warned: false,
            failed: false,
            enabled: true,
        }
    }

    pub fn thresholds(&self) -> PingEntry {
        self.thresholds
    }

    /// Replace the thresholds, keeping the live counter.
    ///
    /// A warning not yet reached under the new `warn` is re-armed. An episode
    /// that already escalated stays failed; otherwise the next miss at or
    /// above the new `fatal` escalates.
    pub fn set_thresholds(&mut self, thresholds: PingEntry) {
        self.thresholds = thresholds;
        if self.misses < thresholds.warn {
            self.warned = false;
        }
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.misses
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable supervision.
    ///
    /// A change of state starts a fresh episode; a redundant call is a no-op.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.reset();
        }
    }

    pub fn health(&self) -> ComponentHealth {
        if !self.enabled {
            ComponentHealth::Disabled
        } else if self.failed {
            ComponentHealth::Failed
        } else if self.warned {
            ComponentHealth::Warning
        } else {
            ComponentHealth::Nominal
        }
    }

    /// Record a response. Returns the miss count of the episode it ended, if any.
    pub fn mark_response(&mut self) -> Option<u32> {
        if !self.enabled || self.misses == 0 {
            return None;
        }
        let ended = self.misses;
        self.reset();
        Some(ended)
    }

    /// Record a missed ping and report which thresholds it crossed.
    pub fn mark_miss(&mut self, policy: WarnPolicy) -> MissOutcome {
        if !self.enabled {
            return MissOutcome::default();
        }

        self.misses = self.misses.saturating_add(1);

        // Episode already escalated
        if self.failed {
            return MissOutcome::default();
        }

        let mut outcome = MissOutcome::default();

        if self.misses >= self.thresholds.warn {
            outcome.warn = match policy {
                WarnPolicy::OncePerEpisode => !self.warned,
                WarnPolicy::EveryCycle => true,
            };
            self.warned = true;
        }

        if self.misses >= self.thresholds.fatal {
            outcome.fatal = true;
            self.failed = true;
        }

        outcome
    }

    fn reset(&mut self) {
        self.misses = 0;
        self.warned = false;
        self.failed = false;
    }
}
