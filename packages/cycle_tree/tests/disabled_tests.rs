//! Tests for the `disabled` feature of the `cycle_tree` crate.

#![cfg(feature = "disabled")]

use std::time::{Duration, Instant};

use cycle_tree::{Error, Profiler, RegionId};

#[test]
fn start_and_stop_record_nothing() {
    let profiler = Profiler::new();
    let outer = profiler.register("outer").unwrap();
    let inner = profiler.register("inner").unwrap();

    profiler.start(outer).unwrap();
    profiler.start(inner).unwrap();

    assert_eq!(profiler.depth(), 0);
    assert_eq!(profiler.stop(inner).unwrap(), 0);
    assert_eq!(profiler.stop(outer).unwrap(), 0);

    assert_eq!(profiler.total_cycles(inner).unwrap(), 0);
    assert_eq!(profiler.parent(inner).unwrap(), None);
    assert!(profiler.report().is_empty());
}

#[test]
fn unbalanced_calls_are_not_errors() {
    let profiler = Profiler::new();
    let id = profiler.register("never_started").unwrap();

    assert_eq!(profiler.stop(id).unwrap(), 0);
    profiler.ensure_balanced().unwrap();
}

#[test]
fn spans_are_no_ops() {
    let profiler = Profiler::new();
    let id = profiler.register("scoped").unwrap();

    {
        let _span = profiler.enter(id).unwrap();
        assert_eq!(profiler.depth(), 0);
    }

    assert_eq!(profiler.enter(id).unwrap().stop().unwrap(), 0);
    assert!(profiler.report().is_empty());
}

#[test]
fn calibration_does_not_spin() {
    let profiler = Profiler::new();
    let started = Instant::now();

    let calibration = profiler.initialize(Duration::from_secs(10));

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(calibration.cycles_per_second(), None);
    assert!(matches!(profiler.calibration(), Err(Error::CalibrationUnset)));
}

#[test]
fn region_macro_registers_nothing() {
    let id: RegionId = cycle_tree::region!("compiled_out").unwrap();

    {
        let _span = cycle_tree::enter(id).unwrap();
    }

    assert_eq!(cycle_tree::depth(), 0);
    assert!(cycle_tree::report().is_empty());
}
