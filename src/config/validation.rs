//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that ping thresholds cover exactly the supervised components
//! - Validate value ranges (fatal >= warn >= 1, budget > 0, log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TopologyConfig → Result<(), Vec<ValidationError>>
//! - Runs before the assembly phase starts

use thiserror::Error;
use tracing::Level;

use crate::config::schema::TopologyConfig;
use crate::topology::{PingThresholdTable, ThresholdError};

/// A single semantic problem in a topology file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error("assembly.memory_budget_bytes must be greater than zero")]
    ZeroMemoryBudget,

    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TopologyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(threshold_errors) = ping_table(config) {
        errors.extend(threshold_errors.into_iter().map(ValidationError::from));
    }

    if config.assembly.memory_budget_bytes == Some(0) {
        errors.push(ValidationError::ZeroMemoryBudget);
    }

    if config.observability.log_level.parse::<Level>().is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Build the threshold table described by `config.ping`.
pub fn ping_table(config: &TopologyConfig) -> Result<PingThresholdTable, Vec<ThresholdError>> {
    PingThresholdTable::from_entries(config.ping.iter().map(|(id, entry)| (*id, *entry)))
}
