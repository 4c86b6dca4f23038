//! Supervisory run/stop/e-stop state machine.
//!
//! Stopped ⇄ Running, any → EmergencyStopped, EmergencyStopped → Running.
//! Button inputs are edge-detected; holding a button does not retrigger.
//! Within one scan the edges are applied Start, then Stop, then EStop, so
//! Stop and EStop always win over a simultaneous Start.

use sortline_common::line::state::SupervisoryState;
use tracing::{info, warn};

/// Result of a supervisory transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded with the new state.
    Ok(SupervisoryState),
    /// Transition rejected, with the reason.
    Rejected(&'static str),
}

/// Event that can change the supervisory state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Start button rising edge.
    Start,
    /// Stop button rising edge.
    Stop,
    /// Emergency stop rising edge.
    EStop,
    /// A sequence stalled.
    Stall,
}

/// Rising-edge detector for one input.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    /// `true` only on a low → high transition.
    #[inline]
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.prev;
        self.prev = level;
        edge
    }
}

/// Edges seen in one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEdges {
    pub start: bool,
    pub stop: bool,
    pub estop: bool,
}

/// Outcome of one supervisory step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorStep {
    pub before: SupervisoryState,
    pub after: SupervisoryState,
    pub edges: ButtonEdges,
}

impl SupervisorStep {
    /// Running before this scan, not running now.
    pub fn left_running(&self) -> bool {
        self.before.is_running() && !self.after.is_running()
    }
}

/// Supervisory state holder with button edge detection.
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    state: SupervisoryState,
    start: EdgeDetector,
    stop: EdgeDetector,
    estop: EdgeDetector,
}

impl Supervisor {
    /// Create a supervisor in Stopped state.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn state(&self) -> SupervisoryState {
        self.state
    }

    /// Attempt a transition.
    pub fn handle_event(&mut self, event: SupervisorEvent) -> TransitionResult {
        use SupervisorEvent::*;
        use SupervisoryState::*;

        let next = match (self.state, event) {
            (Stopped | EmergencyStopped, Start) => Running,
            (Running, Start) => return TransitionResult::Rejected("already running"),

            (Running, Stop) => Stopped,
            (_, Stop) => return TransitionResult::Rejected("not running"),

            (_, EStop) => EmergencyStopped,

            (Running, Stall) => EmergencyStopped,
            (_, Stall) => return TransitionResult::Rejected("stall while not running"),
        };

        if next != self.state {
            match event {
                EStop | Stall => warn!("Supervisor: {} → {} ({event:?})", self.state, next),
                _ => info!("Supervisor: {} → {} ({event:?})", self.state, next),
            }
        }
        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Edge-detect the three buttons and apply the resulting events.
    pub fn step(&mut self, start: bool, stop: bool, estop: bool) -> SupervisorStep {
        let before = self.state;
        let edges = ButtonEdges {
            start: self.start.rising(start),
            stop: self.stop.rising(stop),
            estop: self.estop.rising(estop),
        };

        if edges.start {
            self.handle_event(SupervisorEvent::Start);
        }
        if edges.stop {
            self.handle_event(SupervisorEvent::Stop);
        }
        if edges.estop {
            self.handle_event(SupervisorEvent::EStop);
        }

        SupervisorStep {
            before,
            after: self.state,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SupervisoryState::*;

    #[test]
    fn edge_detector_ignores_level_hold() {
        let mut e = EdgeDetector::default();
        assert!(e.rising(true));
        assert!(!e.rising(true));
        assert!(!e.rising(false));
        assert!(e.rising(true));
    }

    #[test]
    fn start_stop_cycle() {
        let mut sup = Supervisor::new();
        assert_eq!(sup.state(), Stopped);

        let step = sup.step(true, false, false);
        assert_eq!(step.after, Running);
        assert!(step.edges.start);

        // Held start does nothing.
        assert_eq!(sup.step(true, false, false).after, Running);

        let step = sup.step(false, true, false);
        assert_eq!(step.after, Stopped);
        assert!(step.left_running());
    }

    #[test]
    fn estop_from_any_state() {
        for initial in [Stopped, Running, EmergencyStopped] {
            let mut sup = Supervisor::new();
            sup.state = initial;
            assert_eq!(
                sup.handle_event(SupervisorEvent::EStop),
                TransitionResult::Ok(EmergencyStopped)
            );
        }
    }

    #[test]
    fn start_clears_emergency_stop() {
        let mut sup = Supervisor::new();
        sup.step(false, false, true);
        assert_eq!(sup.state(), EmergencyStopped);
        sup.step(true, false, false);
        assert_eq!(sup.state(), Running);
    }

    #[test]
    fn stop_while_stopped_is_rejected() {
        let mut sup = Supervisor::new();
        assert!(matches!(
            sup.handle_event(SupervisorEvent::Stop),
            TransitionResult::Rejected(_)
        ));
        assert_eq!(sup.state(), Stopped);
    }

    #[test]
    fn start_while_running_is_rejected() {
        let mut sup = Supervisor::new();
        sup.handle_event(SupervisorEvent::Start);
        assert!(matches!(
            sup.handle_event(SupervisorEvent::Start),
            TransitionResult::Rejected(_)
        ));
    }

    #[test]
    fn stop_dominates_simultaneous_start() {
        let mut sup = Supervisor::new();
        let step = sup.step(true, true, false);
        assert_eq!(step.after, Stopped);
    }

    #[test]
    fn estop_dominates_simultaneous_start() {
        let mut sup = Supervisor::new();
        sup.step(false, false, true);
        sup.step(false, false, false);
        // Start and EStop in the same scan from EmergencyStopped.
        let step = sup.step(true, false, true);
        assert_eq!(step.after, EmergencyStopped);
    }

    #[test]
    fn stall_only_while_running() {
        let mut sup = Supervisor::new();
        assert!(matches!(
            sup.handle_event(SupervisorEvent::Stall),
            TransitionResult::Rejected(_)
        ));
        sup.handle_event(SupervisorEvent::Start);
        assert_eq!(
            sup.handle_event(SupervisorEvent::Stall),
            TransitionResult::Ok(EmergencyStopped)
        );
    }

    #[test]
    fn exhaustive_two_scan_interleavings() {
        // Every pair of button vectors from every initial state obeys the table.
        let vectors: Vec<(bool, bool, bool)> = (0..8)
            .map(|b| (b & 1 != 0, b & 2 != 0, b & 4 != 0))
            .collect();
        for initial in [Stopped, Running, EmergencyStopped] {
            for first in &vectors {
                for second in &vectors {
                    let mut sup = Supervisor::new();
                    sup.state = initial;
                    for &(s, p, e) in [first, second] {
                        let step = sup.step(s, p, e);
                        if step.edges.estop {
                            assert_eq!(step.after, EmergencyStopped);
                        } else if step.edges.stop && (step.before == Running || step.edges.start) {
                            assert_eq!(step.after, Stopped);
                        } else if step.edges.start {
                            assert_eq!(step.after, Running);
                        } else {
                            assert_eq!(step.after, step.before);
                        }
                    }
                }
            }
        }
    }
}
