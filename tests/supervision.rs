//! Watchdog behaviour against ping thresholds.

use rpi_topology::config::WatchdogConfig;
use rpi_topology::health::{ComponentHealth, HealthSignal, PingOutcome, WarnPolicy, Watchdog, WatchdogError};
use rpi_topology::topology::{ComponentId, PingEntry, PingThresholdTable, ThresholdError, RPI_PING_TABLE};
use strum::IntoEnumIterator;

mod common;

const X: ComponentId = ComponentId::CmdDisp;

fn miss(dog: &mut Watchdog) -> Vec<HealthSignal> {
    dog.record(X, PingOutcome::Missed).unwrap()
}

#[test]
fn test_supervised_thresholds_are_well_formed() {
    for id in ComponentId::SUPERVISED {
        let entry = RPI_PING_TABLE.thresholds_for(id).unwrap();
        assert!(entry.fatal >= entry.warn, "{id}: fatal < warn");
        assert!(entry.warn >= 1, "{id}: warn < 1");
    }
}

#[test]
fn test_unsupervised_lookup_is_configuration_error() {
    for id in ComponentId::iter().filter(|id| !id.is_supervised()) {
        assert_eq!(RPI_PING_TABLE.thresholds_for(id), Err(ThresholdError::Missing(id)));
    }
}

#[test]
fn test_warn_three_fatal_five() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(3, 5), &WatchdogConfig::default());

    assert!(miss(&mut dog).is_empty());
    assert!(miss(&mut dog).is_empty());
    assert_eq!(miss(&mut dog), vec![HealthSignal::Warning { component: X, misses: 3 }]);
    assert!(miss(&mut dog).is_empty());
    assert_eq!(miss(&mut dog), vec![HealthSignal::Fatal { component: X, misses: 5 }]);
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Failed));

    // Terminal for the episode
    assert!(miss(&mut dog).is_empty());
    assert!(miss(&mut dog).is_empty());
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 5)]);
}

#[test]
fn test_response_resets_counter() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(3, 5), &WatchdogConfig::default());

    let mut signals = Vec::new();
    for _ in 0..4 {
        signals.extend(miss(&mut dog));
    }
    assert_eq!(signals.len(), 1);
    assert_eq!(dog.consecutive_misses(X), Ok(4));

    assert!(dog.record(X, PingOutcome::Responded).unwrap().is_empty());
    assert_eq!(dog.consecutive_misses(X), Ok(0));
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Nominal));

    // A new run must reach warn again
    assert!(miss(&mut dog).is_empty());
    assert!(miss(&mut dog).is_empty());
    assert_eq!(miss(&mut dog), vec![HealthSignal::Warning { component: X, misses: 3 }]);
    assert!(escalations.lock().unwrap().is_empty());
}

#[test]
fn test_warn_equals_fatal_at_one() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(1, 1), &WatchdogConfig::default());

    assert_eq!(
        miss(&mut dog),
        vec![
            HealthSignal::Warning { component: X, misses: 1 },
            HealthSignal::Fatal { component: X, misses: 1 },
        ]
    );
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 1)]);
}

#[test]
fn test_warn_equals_fatal_at_three() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(3, 3), &WatchdogConfig::default());

    assert!(miss(&mut dog).is_empty());
    assert!(miss(&mut dog).is_empty());
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Nominal));
    assert_eq!(
        miss(&mut dog),
        vec![
            HealthSignal::Warning { component: X, misses: 3 },
            HealthSignal::Fatal { component: X, misses: 3 },
        ]
    );
    assert!(miss(&mut dog).is_empty());
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 3)]);
}

#[test]
fn test_redundant_enable_does_not_rearm_fatal() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(3, 5), &WatchdogConfig::default());

    for _ in 0..5 {
        miss(&mut dog);
    }
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Failed));

    dog.set_enabled(X, true).unwrap();
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Failed));
    assert_eq!(dog.consecutive_misses(X), Ok(5));

    for _ in 0..5 {
        assert!(miss(&mut dog).is_empty());
    }
    assert_eq!(dog.consecutive_misses(X), Ok(10));
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 5)]);
}

#[test]
fn test_raised_warn_mid_episode_warns_again() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(2, 10), &WatchdogConfig::default());

    assert!(miss(&mut dog).is_empty());
    assert_eq!(miss(&mut dog), vec![HealthSignal::Warning { component: X, misses: 2 }]);

    dog.change_thresholds(X, PingEntry::new(4, 10)).unwrap();
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Nominal));
    assert_eq!(dog.consecutive_misses(X), Ok(2));

    assert!(miss(&mut dog).is_empty());
    assert_eq!(miss(&mut dog), vec![HealthSignal::Warning { component: X, misses: 4 }]);
    assert!(escalations.lock().unwrap().is_empty());
}

#[test]
fn test_lowered_fatal_mid_episode_escalates_next_miss() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(3, 10), &WatchdogConfig::default());

    for _ in 0..6 {
        miss(&mut dog);
    }
    dog.change_thresholds(X, PingEntry::new(3, 5)).unwrap();
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Warning));

    assert_eq!(miss(&mut dog), vec![HealthSignal::Fatal { component: X, misses: 7 }]);
    assert!(miss(&mut dog).is_empty());
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 7)]);
}

#[test]
fn test_recovery_after_fatal_starts_new_episode() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(2, 3), &WatchdogConfig::default());

    for _ in 0..3 {
        miss(&mut dog);
    }
    dog.record(X, PingOutcome::Responded).unwrap();
    for _ in 0..3 {
        miss(&mut dog);
    }
    assert_eq!(*escalations.lock().unwrap(), vec![(X, 3), (X, 3)]);
}

#[test]
fn test_every_cycle_policy() {
    let config = WatchdogConfig { warn_policy: WarnPolicy::EveryCycle };
    let (mut dog, _) = common::single_watchdog(X, PingEntry::new(3, 5), &config);

    let counts: Vec<_> = (0..5).map(|_| miss(&mut dog).len()).collect();
    assert_eq!(counts, vec![0, 0, 1, 1, 2]);
}

#[test]
fn test_disable_and_reenable() {
    let (mut dog, escalations) =
        common::single_watchdog(X, PingEntry::new(1, 2), &WatchdogConfig::default());

    dog.set_enabled(X, false).unwrap();
    for _ in 0..5 {
        assert!(miss(&mut dog).is_empty());
    }
    assert_eq!(dog.health_of(X), Ok(ComponentHealth::Disabled));
    assert!(dog.all_nominal());

    dog.set_enabled(X, true).unwrap();
    assert_eq!(miss(&mut dog).len(), 1);
    assert!(!dog.all_nominal());
    assert!(escalations.lock().unwrap().is_empty());
}

#[test]
fn test_cycle_over_deployment() {
    let (responder, escalations) = common::recording_responder();
    let mut dog = Watchdog::for_deployment(&RPI_PING_TABLE, &WatchdogConfig::default(), responder).unwrap();

    let mut signals = Vec::new();
    for _ in 0..5 {
        let cycle = ComponentId::SUPERVISED.map(|id| {
            let outcome = if id == ComponentId::PrmDb {
                PingOutcome::Missed
            } else {
                PingOutcome::Responded
            };
            (id, outcome)
        });
        signals.extend(dog.run_cycle(cycle).unwrap());
    }

    assert_eq!(
        signals,
        vec![
            HealthSignal::Warning { component: ComponentId::PrmDb, misses: 3 },
            HealthSignal::Fatal { component: ComponentId::PrmDb, misses: 5 },
        ]
    );
    assert_eq!(*escalations.lock().unwrap(), vec![(ComponentId::PrmDb, 5)]);
    assert_eq!(dog.health_of(ComponentId::CmdSeq), Ok(ComponentHealth::Nominal));
    assert_eq!(
        dog.record(ComponentId::Uplink, PingOutcome::Responded),
        Err(WatchdogError::NotSupervised(ComponentId::Uplink))
    );
}

#[test]
fn test_synthetic_table_missing_entry() {
    let table = PingThresholdTable::empty().with(ComponentId::CmdSeq, PingEntry::new(2, 2));
    let (responder, _) = common::recording_responder();
    let errors = Watchdog::for_deployment(&table, &WatchdogConfig::default(), responder).unwrap_err();
    assert_eq!(errors.len(), ComponentId::SUPERVISED.len() - 1);
    assert!(!errors.contains(&ThresholdError::Missing(ComponentId::CmdSeq)));
}
