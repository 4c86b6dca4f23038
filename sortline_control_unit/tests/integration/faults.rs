//! Integration test: transport faults are recovered inside the scan.

use sortline_common::line::state::{SupervisoryState, TurntablePhase};
use sortline_control_unit::error::LineError;
use sortline_control_unit::image::{Coil, Sensor};

use super::harness::Line;

#[test]
fn failed_read_is_logical_false() {
    let mut line = Line::running();
    line.set(Sensor::LoadPresence, true);
    line.scan();
    line.set(Sensor::LoadPresence, false);
    assert_eq!(line.phase(), TurntablePhase::Loading);

    let front = line.runner.channels().sensor(Sensor::TableFront).address;
    line.runner.port_mut().fail_reads(front);
    line.set(Sensor::TableFront, true);

    let faults = line.scan();
    assert!(faults.contains(LineError::READ_FAULT));
    assert!(!faults.has_critical());
    assert_eq!(line.phase(), TurntablePhase::Loading);
    assert_eq!(line.state(), SupervisoryState::Running);
    assert!(line.runner.stats().read_faults >= 1);

    line.runner.port_mut().clear_faults();
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Positioned);
}

#[test]
fn failed_write_is_retried_next_scan() {
    let mut line = Line::new();
    let conveyor = line.runner.channels().coil(Coil::Conveyor1).address;
    line.runner.port_mut().fail_writes(conveyor);

    line.set(Sensor::Start, true);
    let faults = line.scan();
    assert!(faults.contains(LineError::WRITE_FAULT));
    assert_eq!(line.state(), SupervisoryState::Running);
    assert!(!line.coil(Coil::Conveyor1));
    assert!(line.coil(Coil::Conveyor2));

    line.runner.port_mut().clear_faults();
    let faults = line.scan();
    assert!(faults.is_empty());
    assert!(line.coil(Coil::Conveyor1));
    assert_eq!(line.runner.stats().write_faults, 1);
}

#[test]
fn unreadable_estop_does_not_trip() {
    let mut line = Line::running();
    let estop = line.runner.channels().sensor(Sensor::EStop).address;
    line.runner.port_mut().fail_reads(estop);
    for _ in 0..3 {
        line.scan();
    }
    assert_eq!(line.state(), SupervisoryState::Running);
}

#[test]
fn faults_do_not_leak_between_scans() {
    let mut line = Line::running();
    let start = line.runner.channels().sensor(Sensor::Start).address;
    line.runner.port_mut().fail_reads(start);
    assert!(line.scan().contains(LineError::READ_FAULT));
    line.runner.port_mut().clear_faults();
    assert!(line.scan().is_empty());
    assert!(line.runner.last_faults().is_empty());
}
