//! Per-component ping thresholds.
//!
//! # Semantics
//! ```text
//! consecutive misses == warn  → warning signal
//! consecutive misses == fatal → fatal signal, escalation, episode ends
//! any response                → counter back to 0
//! ```
//!
//! The table is policy only. Live counters belong to the watchdog
//! (`crate::health::watchdog`), which copies the thresholds once at
//! construction.
//!
//! # Invariants
//! - Every entry satisfies `fatal >= warn >= 1`
//! - The key set is exactly [`ComponentId::SUPERVISED`]
//! - Looking up any other component is a configuration error

use serde::{Deserialize, Serialize};
use strum::EnumCount;
use thiserror::Error;

use crate::topology::components::ComponentId;

/// Warning and fatal thresholds, in consecutive missed pings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PingEntry {
    pub warn: u32,
    pub fatal: u32,
}

impl PingEntry {
    pub const fn new(warn: u32, fatal: u32) -> Self {
        Self { warn, fatal }
    }

    /// Returns true if `fatal >= warn >= 1`.
    pub const fn is_valid(&self) -> bool {
        self.warn >= 1 && self.fatal >= self.warn
    }

    /// Check the threshold invariant, naming `component` on failure.
    pub fn validate(&self, component: ComponentId) -> Result<(), ThresholdError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ThresholdError::Invalid {
                component,
                warn: self.warn,
                fatal: self.fatal,
            })
        }
    }
}

/// Configuration errors in a threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    /// A component was looked up (or is supervised) but has no entry.
    #[error("no ping thresholds configured for {0}")]
    Missing(ComponentId),

    /// An entry violates `fatal >= warn >= 1`.
    #[error("invalid ping thresholds for {component}: warn={warn}, fatal={fatal} (require fatal >= warn >= 1)")]
    Invalid {
        component: ComponentId,
        warn: u32,
        fatal: u32,
    },

    /// An entry exists for a component that is not ping-supervised.
    #[error("ping thresholds configured for unsupervised component {0}")]
    Unsupervised(ComponentId),

    /// The same component appears twice.
    #[error("duplicate ping thresholds for {0}")]
    Duplicate(ComponentId),
}

/// Fixed table of ping thresholds indexed by [`ComponentId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingThresholdTable {
    entries: [Option<PingEntry>; ComponentId::COUNT],
}

impl PingThresholdTable {
    /// A table with no entries.
    pub const fn empty() -> Self {
        Self {
            entries: [None; ComponentId::COUNT],
        }
    }

    /// Builder used for `const` tables; later calls for the same id win.
    pub const fn with(mut self, component: ComponentId, entry: PingEntry) -> Self {
        self.entries[component.index()] = Some(entry);
        self
    }

    /// Build a table from `(component, entry)` pairs.
    ///
    /// Every problem is reported: invalid values, duplicates, entries for
    /// unsupervised components and supervised components left out.
    pub fn from_entries<I>(entries: I) -> Result<Self, Vec<ThresholdError>>
    where
        I: IntoIterator<Item = (ComponentId, PingEntry)>,
    {
        let mut table = Self::empty();
        let mut errors = Vec::new();

        for (component, entry) in entries {
            if !component.is_supervised() {
                errors.push(ThresholdError::Unsupervised(component));
                continue;
            }
            if table.entries[component.index()].is_some() {
                errors.push(ThresholdError::Duplicate(component));
                continue;
            }
            if let Err(e) = entry.validate(component) {
                errors.push(e);
            }
            table.entries[component.index()] = Some(entry);
        }

        if let Err(missing) = table.check_coverage() {
            errors.extend(missing);
        }

        if errors.is_empty() {
            Ok(table)
        } else {
            Err(errors)
        }
    }

    /// Thresholds for `component`.
    ///
    /// An absent entry is a configuration error, never a default.
    pub fn thresholds_for(&self, component: ComponentId) -> Result<PingEntry, ThresholdError> {
        self.entries[component.index()].ok_or(ThresholdError::Missing(component))
    }

    /// Returns a `Missing` error for every supervised component without an entry.
    pub fn check_coverage(&self) -> Result<(), Vec<ThresholdError>> {
        let missing: Vec<_> = ComponentId::SUPERVISED
            .iter()
            .filter(|id| self.entries[id.index()].is_none())
            .map(|id| ThresholdError::Missing(*id))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Compile-time check: all entries valid, key set == supervised set.
    pub const fn is_well_formed(&self) -> bool {
        let mut i = 0;
        while i < ComponentId::COUNT {
            if let Some(entry) = &self.entries[i] {
                if !entry.is_valid() {
                    return false;
                }
            }
            i += 1;
        }

        let mut configured = 0;
        let mut i = 0;
        while i < ComponentId::COUNT {
            if self.entries[i].is_some() {
                configured += 1;
            }
            i += 1;
        }

        let mut i = 0;
        while i < ComponentId::SUPERVISED.len() {
            if self.entries[ComponentId::SUPERVISED[i].index()].is_none() {
                return false;
            }
            i += 1;
        }

        configured == ComponentId::SUPERVISED.len()
    }

    /// Configured entries in component order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, PingEntry)> + '_ {
        ComponentId::SUPERVISED
            .iter()
            .filter_map(|id| self.entries[id.index()].map(|entry| (*id, entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PingThresholdTable {
    fn default() -> Self {
        RPI_PING_TABLE
    }
}

const DEFAULT_PING: PingEntry = PingEntry::new(3, 5);

/// Ping thresholds of the reference deployment.
pub const RPI_PING_TABLE: PingThresholdTable = PingThresholdTable::empty()
    .with(ComponentId::RateGroup10HzComp, DEFAULT_PING)
    .with(ComponentId::RateGroup1HzComp, DEFAULT_PING)
    .with(ComponentId::CmdDisp, DEFAULT_PING)
    .with(ComponentId::CmdSeq, DEFAULT_PING)
    .with(ComponentId::ChanTlm, DEFAULT_PING)
    .with(ComponentId::EventLogger, DEFAULT_PING)
    .with(ComponentId::PrmDb, DEFAULT_PING)
    .with(ComponentId::FileDownlink, DEFAULT_PING)
    .with(ComponentId::FileUplink, DEFAULT_PING);

const _: () = assert!(RPI_PING_TABLE.is_well_formed(), "RPI_PING_TABLE is malformed");
