//! Integration test: supervisory run/stop/e-stop over full scans.

use sortline_common::line::state::{SupervisoryState, TurntablePhase};
use sortline_control_unit::image::{Coil, OutputImage, Sensor};

use super::harness::Line;

#[test]
fn start_energizes_feed_bank_and_green_light() {
    let line = Line::running();
    for coil in Coil::FEED_BANK {
        assert!(line.coil(coil), "{coil:?} should be on");
    }
    assert!(line.coil(Coil::LightGreen));
    assert!(!line.coil(Coil::LightRed));
    assert!(!line.coil(Coil::TableTurn));
}

#[test]
fn stop_switches_everything_off() {
    let mut line = Line::running();
    line.press(Sensor::Stop);
    assert_eq!(line.state(), SupervisoryState::Stopped);
    assert!(line.energized().is_empty());
}

#[test]
fn held_start_does_not_retrigger_after_stop() {
    let mut line = Line::new();
    line.set(Sensor::Start, true);
    line.scan();
    assert_eq!(line.state(), SupervisoryState::Running);

    line.press(Sensor::Stop);
    // Start still held: no new edge.
    line.scan();
    assert_eq!(line.state(), SupervisoryState::Stopped);
}

#[test]
fn stop_dominates_start_in_same_scan() {
    let mut line = Line::new();
    line.set(Sensor::Start, true);
    line.set(Sensor::Stop, true);
    line.scan();
    assert_eq!(line.state(), SupervisoryState::Stopped);
    assert!(line.energized().is_empty());
}

#[test]
fn estop_dominates_start_in_same_scan() {
    let mut line = Line::new();
    line.set(Sensor::Start, true);
    line.set(Sensor::EStop, true);
    line.scan();
    assert_eq!(line.state(), SupervisoryState::EmergencyStopped);
    assert_eq!(line.energized(), vec![Coil::LightRed]);
}

#[test]
fn estop_is_visible_and_cleared_by_start() {
    let mut line = Line::running();
    line.press(Sensor::EStop);
    assert_eq!(line.state(), SupervisoryState::EmergencyStopped);
    assert_eq!(line.energized(), vec![Coil::LightRed]);

    line.press(Sensor::Start);
    assert_eq!(line.state(), SupervisoryState::Running);
    assert!(!line.coil(Coil::LightRed));
    assert!(line.coil(Coil::LightGreen));
}

#[test]
fn estop_mid_ejecting_discards_box() {
    let mut line = Line::running();
    line.measure(&[3]);
    line.measure(&[1]);
    line.load_box();
    line.scan();
    line.set(Sensor::TableLimit90, true);
    line.scan();
    assert_eq!(line.phase(), TurntablePhase::Ejecting);
    assert!(line.coil(Coil::TableTurn));
    assert_eq!(line.runner.queue().len(), 1);

    line.set(Sensor::EStop, true);
    line.scan();
    assert_eq!(line.state(), SupervisoryState::EmergencyStopped);
    assert_eq!(line.energized(), vec![Coil::LightRed]);
    assert!(line.runner.queue().is_empty());
    assert_eq!(line.phase(), TurntablePhase::Idle);
    assert_eq!(line.runner.turntable().current_box, None);

    // Restart: sequencer begins from Idle even with the table sensors still high.
    line.set(Sensor::EStop, false);
    line.set(Sensor::TableFront, false);
    line.set(Sensor::TableBack, false);
    line.press(Sensor::Start);
    assert_eq!(line.state(), SupervisoryState::Running);
    assert_eq!(line.phase(), TurntablePhase::Idle);
}

#[test]
fn stop_clears_partial_height_measurement() {
    let mut line = Line::running();
    line.set(Sensor::PassThrough, true);
    line.set_blocked(4);
    line.scan();
    assert!(line.runner.height().is_active());

    line.press(Sensor::Stop);
    assert!(!line.runner.height().is_active());

    line.set(Sensor::PassThrough, false);
    line.press(Sensor::Start);
    assert!(line.runner.queue().is_empty());
}

#[test]
fn all_off_is_idempotent() {
    let mut line = Line::running();
    line.runner.shutdown();
    let once = line.runner.port().coils_on();
    line.runner.shutdown();
    assert_eq!(line.runner.port().coils_on(), once);
    assert!(once.is_empty());
    assert_eq!(*line.runner.outputs(), OutputImage::all_off());
}
