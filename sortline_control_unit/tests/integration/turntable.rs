//! Integration test: turntable load → rotate → eject → return.

use sortline_common::line::config::LineConfig;
use sortline_common::line::state::{Direction, SupervisoryState, TurntablePhase};
use sortline_control_unit::error::LineError;
use sortline_control_unit::image::{Coil, Sensor};

use super::harness::Line;

const TABLE_FEED: [Coil; 4] = [Coil::Conveyor1, Coil::Conveyor2, Coil::Load1, Coil::Roller6m1];

/// Rotate, eject towards `exit`, return. Checks the turn coil never drops
/// between Rotating and Ejecting and that the table feed stays held until Idle.
fn rotate_eject_return(line: &mut Line, exit: Sensor, roll: Coil) {
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Rotating);
    assert!(line.coil(Coil::TableTurn));
    assert!(!line.coil(roll));

    line.scan();
    assert!(line.coil(Coil::TableTurn));

    line.set(Sensor::TableLimit0, false);
    line.set(Sensor::TableLimit90, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Ejecting);
    assert!(line.coil(Coil::TableTurn));
    assert!(line.coil(roll));

    // Box leaves the table but is still on the exit sensor.
    line.set(Sensor::TableFront, false);
    line.set(Sensor::TableBack, false);
    line.set(exit, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Ejecting);
    assert!(line.coil(Coil::TableTurn) && line.coil(roll));

    line.set(exit, false);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Returning);
    assert!(!line.coil(Coil::TableTurn));
    assert!(!line.coil(Coil::TableRollPlus) && !line.coil(Coil::TableRollMinus));
    for coil in TABLE_FEED {
        assert!(!line.coil(coil), "{coil:?} resumed before Idle");
    }
    assert!(line.coil(Coil::LightYellow));

    line.set(Sensor::TableLimit90, false);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Returning);

    line.set(Sensor::TableLimit0, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Idle);
    assert_eq!(line.runner.turntable().current_box, None);
    for coil in TABLE_FEED {
        assert!(line.coil(coil), "{coil:?} not resumed at Idle");
    }
    assert!(line.coil(Coil::LightGreen));
}

#[test]
fn small_box_ejected_right() {
    let mut line = Line::running();
    line.set(Sensor::TableLimit0, true);
    line.measure(&[1, 2, 1]);

    line.set(Sensor::LoadPresence, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Loading);
    assert!(line.coil(Coil::TableRollPlus));
    assert!(line.coil(Coil::Conveyor1), "feed held before the box is seated");

    line.set(Sensor::LoadPresence, false);
    line.set(Sensor::TableBack, true);
    line.scan();
    for coil in TABLE_FEED {
        assert!(!line.coil(coil));
    }
    assert!(line.coil(Coil::Load2));
    assert!(line.coil(Coil::Emitter1));

    line.set(Sensor::TableFront, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Positioned);
    assert!(!line.coil(Coil::TableRollPlus));

    rotate_eject_return(&mut line, Sensor::ExitRight, Coil::TableRollPlus);
}

#[test]
fn large_box_ejected_left() {
    let mut line = Line::running();
    line.set(Sensor::TableLimit0, true);
    line.measure(&[4]);
    line.load_box();
    rotate_eject_return(&mut line, Sensor::ExitLeft, Coil::TableRollMinus);
}

#[test]
fn empty_queue_completes_cycle_with_fallback() {
    let mut line = Line::running();
    line.set(Sensor::TableLimit0, true);
    assert!(line.runner.queue().is_empty());
    line.load_box();
    assert_eq!(line.runner.turntable().current_box, None);

    line.scan();
    assert_eq!(line.runner.turntable().eject_direction, Some(Direction::Left));
    rotate_eject_return(&mut line, Sensor::ExitLeft, Coil::TableRollMinus);
}

#[test]
fn configured_fallback_right() {
    let mut config = LineConfig::default();
    config.routing.fallback = Direction::Right;
    let mut line = Line::with_config(config);
    line.press(Sensor::Start);
    line.set(Sensor::TableLimit0, true);
    line.measure(&[7]);
    line.load_box();
    rotate_eject_return(&mut line, Sensor::ExitRight, Coil::TableRollPlus);
}

#[test]
fn wrong_side_exit_sensor_does_not_hold_ejection() {
    let mut line = Line::running();
    line.measure(&[1]);
    line.load_box();
    line.scan();
    line.set(Sensor::TableLimit90, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Ejecting);

    line.set(Sensor::TableFront, false);
    line.set(Sensor::TableBack, false);
    line.set(Sensor::ExitLeft, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Returning);
}

#[test]
fn stall_forces_emergency_stop() {
    let mut config = LineConfig::default();
    config.control.stall_timeout_ms = 1500;
    let mut line = Line::with_config(config);
    line.press(Sensor::Start);
    line.load_box();
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Rotating);

    // 90° limit never arrives.
    let mut raised = LineError::empty();
    for _ in 0..20 {
        raised |= line.scan();
        if line.state() != SupervisoryState::Running {
            break;
        }
    }
    assert!(raised.contains(LineError::TURNTABLE_STALL));
    assert_eq!(line.state(), SupervisoryState::EmergencyStopped);
    assert_eq!(line.phase(), TurntablePhase::Idle);
    assert_eq!(line.energized(), vec![Coil::LightRed]);
}
