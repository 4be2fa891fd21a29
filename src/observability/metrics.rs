//! Supervision metrics.
//!
//! # Metrics
//! - `watchdog_consecutive_misses` (gauge): live miss counter per component
//! - `watchdog_signals_total` (counter): signals by component and severity

use crate::health::HealthSignal;
use crate::topology::ComponentId;

/// Record the current miss counter of a component.
pub fn record_consecutive_misses(component: ComponentId, misses: u32) {
    ::metrics::gauge!("watchdog_consecutive_misses", "component" => component.to_string()).set(f64::from(misses));
}

/// Count an emitted health signal.
pub fn record_health_signal(signal: &HealthSignal) {
    ::metrics::counter!(
        "watchdog_signals_total",
        "component" => signal.component().to_string(),
        "severity" => signal.severity().to_string()
    )
    .increment(1);
}
