//! Integration test: light-curtain measurement into the box queue.

use sortline_control_unit::image::Sensor;

use super::harness::Line;

#[test]
fn observed_maximum_is_enqueued() {
    let mut line = Line::running();
    line.measure(&[0, 0, 3, 5, 5, 2, 0]);
    assert_eq!(line.runner.queue().sizes(), vec![5]);
    assert_eq!(line.runner.height().running_max(), 0);
}

#[test]
fn zero_height_transit_is_dropped() {
    let mut line = Line::running();
    line.measure(&[0, 0, 0]);
    assert!(line.runner.queue().is_empty());
}

#[test]
fn boxes_queue_in_arrival_order() {
    let mut line = Line::running();
    line.measure(&[1, 2]);
    line.measure(&[4]);
    line.measure(&[3, 1]);
    assert_eq!(line.runner.queue().sizes(), vec![2, 4, 3]);
}

#[test]
fn curtain_ignored_while_stopped() {
    let mut line = Line::new();
    line.measure(&[4]);
    line.press(Sensor::Start);
    assert!(line.runner.queue().is_empty());
}
