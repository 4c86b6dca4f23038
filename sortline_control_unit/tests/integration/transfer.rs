//! Integration test: line 2 → line 1 transfer interlock.

use sortline_common::line::state::{TransferPhase, TurntablePhase};
use sortline_control_unit::image::{Coil, Sensor};

use super::harness::Line;

const TRANSFER_FEED: [Coil; 4] = [
    Coil::Conveyor1,
    Coil::Conveyor2,
    Coil::Emitter1,
    Coil::Emitter2,
];

fn transfer_phase(line: &Line) -> TransferPhase {
    line.runner.transfer().phase
}

#[test]
fn arms_only_with_clear_zone() {
    for blocker in [Sensor::AtExit, Sensor::AtEntry1, Sensor::AtTransfer1] {
        let mut line = Line::running();
        line.set(Sensor::AtTransfer2, true);
        line.set(blocker, true);
        line.scan();
        assert_eq!(transfer_phase(&line), TransferPhase::Idle, "{blocker:?}");
        assert!(!line.coil(Coil::TransferLeft1));
    }

    let mut line = Line::running();
    line.set(Sensor::AtTransfer2, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Arming);
}

#[test]
fn full_transfer_sequence() {
    let mut line = Line::running();
    line.set(Sensor::AtTransfer2, true);
    line.scan();
    assert!(line.coil(Coil::TransferLeft1) && line.coil(Coil::TransferLeft2));
    for coil in TRANSFER_FEED {
        assert!(!line.coil(coil), "{coil:?} should be held");
    }
    assert!(line.coil(Coil::Load1));
    assert!(line.coil(Coil::Load2));

    // Ejection delay: 500 ms at 150 ms scans.
    line.set(Sensor::AtTransfer2, false);
    for _ in 0..3 {
        line.scan();
        assert_eq!(transfer_phase(&line), TransferPhase::Arming);
    }
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::WaitingArrival);
    assert!(line.coil(Coil::TransferLeft1));

    // Scans keep running while waiting; EStop stays responsive.
    for _ in 0..5 {
        line.scan();
    }
    assert_eq!(transfer_phase(&line), TransferPhase::WaitingArrival);

    line.set(Sensor::AtTransfer1, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Releasing);
    assert!(!line.coil(Coil::TransferLeft1) && !line.coil(Coil::TransferLeft2));
    assert!(!line.coil(Coil::Conveyor1));

    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Releasing);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Idle);
    for coil in TRANSFER_FEED {
        assert!(line.coil(coil), "{coil:?} should resume");
    }
}

#[test]
fn estop_while_waiting_for_arrival() {
    let mut line = Line::running();
    line.set(Sensor::AtTransfer2, true);
    line.scan();
    line.set(Sensor::AtTransfer2, false);
    for _ in 0..4 {
        line.scan();
    }
    assert_eq!(transfer_phase(&line), TransferPhase::WaitingArrival);

    line.set(Sensor::EStop, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Idle);
    assert_eq!(line.energized(), vec![Coil::LightRed]);
}

#[test]
fn no_transfer_during_turntable_load() {
    let mut line = Line::running();
    line.set(Sensor::LoadPresence, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Loading);

    line.set(Sensor::AtTransfer2, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Idle);
}

#[test]
fn transfer_release_keeps_turntable_hold() {
    let mut line = Line::running();
    line.set(Sensor::TableLimit0, true);
    line.load_box();
    assert!(!line.coil(Coil::Conveyor1));

    line.set(Sensor::AtTransfer2, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Arming);
    line.set(Sensor::AtTransfer2, false);
    for _ in 0..4 {
        line.scan();
    }
    line.set(Sensor::AtTransfer1, true);
    for _ in 0..3 {
        line.scan();
    }
    assert_eq!(transfer_phase(&line), TransferPhase::Idle);

    // Transfer done but the table is still occupied.
    assert_ne!(line.phase(), TurntablePhase::Idle);
    assert!(!line.coil(Coil::Conveyor1));
    assert!(!line.coil(Coil::Conveyor2));
    assert!(line.coil(Coil::Emitter1));
}

#[test]
fn no_turntable_load_during_transfer() {
    let mut line = Line::running();
    line.set(Sensor::TableLimit0, true);
    line.measure(&[2, 2]);
    assert_eq!(line.runner.queue().len(), 1);

    line.set(Sensor::AtTransfer2, true);
    line.scan();
    assert_eq!(transfer_phase(&line), TransferPhase::Arming);

    // Box waiting at the table for the whole transfer.
    line.set(Sensor::AtTransfer2, false);
    line.set(Sensor::LoadPresence, true);
    for scan in 0..20 {
        if scan == 10 {
            line.set(Sensor::AtTransfer1, true);
        }
        line.scan();
        if transfer_phase(&line) == TransferPhase::Idle {
            break;
        }
        assert_eq!(line.phase(), TurntablePhase::Idle, "scan {scan}");
        assert!(!line.coil(Coil::TableRollPlus));
        assert_eq!(line.runner.queue().len(), 1);
    }
    assert_eq!(transfer_phase(&line), TransferPhase::Idle);

    // Load starts in the scan the transfer finishes.
    assert_eq!(line.phase(), TurntablePhase::Loading);
    assert!(line.coil(Coil::TableRollPlus));
    assert!(line.runner.queue().is_empty());
}
