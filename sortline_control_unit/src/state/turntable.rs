//! Turntable sequencer.
//!
//! `Idle → Loading → Positioned → Rotating → Ejecting → Returning → Idle`
//!
//! One box at a time. The sequencer reads the table sensors, takes the
//! next size class from the queue when a box arrives, and drives the
//! turn and roll coils. Outputs are derived from the phase reached at the
//! end of the step, so a phase's coil contract holds from the scan it is
//! entered.
//!
//! The turn coil is held from Rotating through Ejecting; releasing it in
//! between would let the table back-drive off the 90° limit.
//!
//! A load never starts while a line 2 → line 1 transfer is in progress;
//! the box waits at the load-presence sensor until the transfer is Idle.

use std::time::Instant;

use sortline_common::line::config::RoutingConfig;
use sortline_common::line::state::{BoxSizeClass, Direction, TransferPhase, TurntablePhase};
use tracing::{debug, info, warn};

use super::queue::BoxQueue;
use crate::error::{Sequence, StallFault};
use crate::image::{InputImage, Sensor};

/// Sequencer state owned by the scan loop.
#[derive(Debug, Clone, Default)]
pub struct TurntableSession {
    pub phase: TurntablePhase,
    pub current_box: Option<BoxSizeClass>,
    pub eject_direction: Option<Direction>,
    /// Box reached the back limit during Loading; upstream feed is held.
    pub seated: bool,
    /// Scans spent in the current phase.
    pub cycles_in_phase: u32,
    /// When the current phase was entered.
    pub entered_at: Option<Instant>,
}

impl TurntableSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to Idle, discarding the box in progress.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Upstream conveyors feeding the table must stay off.
    pub fn holds_feed(&self) -> bool {
        match self.phase {
            TurntablePhase::Idle => false,
            TurntablePhase::Loading => self.seated,
            _ => true,
        }
    }

    fn enter(&mut self, next: TurntablePhase) {
        debug!(
            "Turntable: {} → {} after {} scans",
            self.phase, next, self.cycles_in_phase
        );
        self.phase = next;
        self.cycles_in_phase = 0;
        self.entered_at = Some(Instant::now());
    }
}

/// Turntable coil commands for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurntableOutputs {
    pub turn: bool,
    pub roll_plus: bool,
    pub roll_minus: bool,
    /// Hold the conveyors feeding the table off.
    pub feed_hold: bool,
}

impl TurntableOutputs {
    fn for_session(session: &TurntableSession) -> Self {
        let mut out = Self {
            feed_hold: session.holds_feed(),
            ..Self::default()
        };
        match session.phase {
            TurntablePhase::Idle | TurntablePhase::Positioned | TurntablePhase::Returning => {}
            TurntablePhase::Loading => out.roll_plus = true,
            TurntablePhase::Rotating => out.turn = true,
            TurntablePhase::Ejecting => {
                out.turn = true;
                match session.eject_direction {
                    Some(Direction::Right) => out.roll_plus = true,
                    Some(Direction::Left) => out.roll_minus = true,
                    None => {}
                }
            }
        }
        out
    }
}

/// Exit sensor watched while ejecting towards `direction`.
pub const fn exit_sensor(direction: Direction) -> Sensor {
    match direction {
        Direction::Left => Sensor::ExitLeft,
        Direction::Right => Sensor::ExitRight,
    }
}

/// Turntable sequencing policy.
#[derive(Debug, Clone)]
pub struct TurntableSequencer {
    routing: RoutingConfig,
    stall_cycles: Option<u32>,
}

impl TurntableSequencer {
    /// `stall_cycles = None` disables the stall check.
    pub fn new(routing: RoutingConfig, stall_cycles: Option<u32>) -> Self {
        Self {
            routing,
            stall_cycles,
        }
    }

    /// Ejection side for a box, falling back when the size is unknown.
    pub fn route(&self, size: Option<BoxSizeClass>) -> Direction {
        match self.routing.direction_for(size) {
            Some(direction) => {
                info!("Routing box size {} → {direction}", fmt_size(size));
                direction
            }
            None => {
                let fallback = self.routing.fallback;
                warn!(
                    "Routing box size {} matched no range, using fallback {fallback}",
                    fmt_size(size)
                );
                fallback
            }
        }
    }

    /// Advance one scan. `transfer` is the transfer phase for this scan.
    pub fn step(
        &self,
        session: &mut TurntableSession,
        inputs: &InputImage,
        queue: &mut BoxQueue,
        transfer: TransferPhase,
    ) -> Result<TurntableOutputs, StallFault> {
        if session.phase != TurntablePhase::Idle {
            session.cycles_in_phase = session.cycles_in_phase.saturating_add(1);
        }

        match session.phase {
            TurntablePhase::Idle => {
                if inputs.get(Sensor::LoadPresence) && transfer.is_idle() {
                    session.current_box = queue.pop();
                    session.eject_direction = None;
                    session.seated = false;
                    session.enter(TurntablePhase::Loading);
                }
            }
            TurntablePhase::Loading => {
                if inputs.get(Sensor::TableBack) && !session.seated {
                    debug!("Turntable: box seated, holding feed");
                    session.seated = true;
                }
                if inputs.get(Sensor::TableFront) {
                    session.enter(TurntablePhase::Positioned);
                }
            }
            TurntablePhase::Positioned => {
                session.eject_direction = Some(self.route(session.current_box));
                session.enter(TurntablePhase::Rotating);
            }
            TurntablePhase::Rotating => {
                if inputs.get(Sensor::TableLimit90) {
                    session.enter(TurntablePhase::Ejecting);
                }
            }
            TurntablePhase::Ejecting => {
                let direction = session.eject_direction.unwrap_or(self.routing.fallback);
                let clear = !inputs.get(Sensor::TableFront)
                    && !inputs.get(Sensor::TableBack)
                    && !inputs.get(exit_sensor(direction));
                if clear {
                    session.enter(TurntablePhase::Returning);
                }
            }
            TurntablePhase::Returning => {
                if inputs.get(Sensor::TableLimit0) {
                    session.enter(TurntablePhase::Idle);
                    session.current_box = None;
                    session.eject_direction = None;
                    session.seated = false;
                }
            }
        }

        self.check_stall(session)?;
        Ok(TurntableOutputs::for_session(session))
    }

    fn check_stall(&self, session: &TurntableSession) -> Result<(), StallFault> {
        let Some(limit) = self.stall_cycles else {
            return Ok(());
        };
        let watched = matches!(
            session.phase,
            TurntablePhase::Loading
                | TurntablePhase::Rotating
                | TurntablePhase::Ejecting
                | TurntablePhase::Returning
        );
        if watched && session.cycles_in_phase >= limit {
            return Err(StallFault {
                sequence: Sequence::Turntable,
                phase: phase_name(session.phase),
                cycles: session.cycles_in_phase,
            });
        }
        Ok(())
    }
}

fn fmt_size(size: Option<BoxSizeClass>) -> String {
    size.map_or_else(|| "none".to_string(), |s| s.to_string())
}

const fn phase_name(phase: TurntablePhase) -> &'static str {
    match phase {
        TurntablePhase::Idle => "IDLE",
        TurntablePhase::Loading => "LOADING",
        TurntablePhase::Positioned => "POSITIONED",
        TurntablePhase::Rotating => "ROTATING",
        TurntablePhase::Ejecting => "EJECTING",
        TurntablePhase::Returning => "RETURNING",
    }
}
