//! Line 2 → line 1 transfer interlock.
//!
//! `Idle → Arming → WaitingArrival → Releasing → Idle`
//!
//! Stepped once per scan; nothing here blocks the loop. While a transfer is
//! in progress the line 1/2 conveyors and emitters are held off through the
//! feed arbiter and both transfer-left actuators are driven until the box
//! is seen at the line 1 transfer point.

use sortline_common::line::state::{TransferPhase, TurntablePhase};
use tracing::debug;

use crate::error::{Sequence, StallFault};
use crate::image::{InputImage, Sensor};

/// Interlock state owned by the scan loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSession {
    pub phase: TransferPhase,
    /// Scans spent in the current phase.
    pub cycles_in_phase: u32,
}

impl TransferSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn enter(&mut self, next: TransferPhase) {
        debug!(
            "Transfer: {:?} → {:?} after {} scans",
            self.phase, next, self.cycles_in_phase
        );
        self.phase = next;
        self.cycles_in_phase = 0;
    }
}

/// Transfer coil commands for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOutputs {
    /// Both transfer-left actuators.
    pub transfer_left: bool,
    /// Hold line 1/2 conveyors and emitters off.
    pub feed_hold: bool,
}

/// Shared zone is clear and a box waits at the line 2 transfer point.
///
/// Any traffic at the exit, line 1 entry or line 1 transfer point blocks it.
pub fn guard(inputs: &InputImage) -> bool {
    inputs.get(Sensor::AtTransfer2)
        && !inputs.get(Sensor::AtExit)
        && !inputs.get(Sensor::AtEntry1)
        && !inputs.get(Sensor::AtTransfer1)
}

/// Transfer timing, in scans.
#[derive(Debug, Clone, Copy)]
pub struct TransferInterlock {
    ejection_cycles: u32,
    resume_cycles: u32,
    stall_cycles: Option<u32>,
}

impl TransferInterlock {
    pub fn new(ejection_cycles: u32, resume_cycles: u32, stall_cycles: Option<u32>) -> Self {
        Self {
            ejection_cycles,
            resume_cycles,
            stall_cycles,
        }
    }

    /// Advance one scan.
    ///
    /// A transfer never arms while the turntable is loading.
    pub fn step(
        &self,
        session: &mut TransferSession,
        inputs: &InputImage,
        turntable: TurntablePhase,
    ) -> Result<TransferOutputs, StallFault> {
        if session.phase != TransferPhase::Idle {
            session.cycles_in_phase = session.cycles_in_phase.saturating_add(1);
        }

        match session.phase {
            TransferPhase::Idle => {
                if turntable != TurntablePhase::Loading && guard(inputs) {
                    session.enter(TransferPhase::Arming);
                }
            }
            TransferPhase::Arming => {
                if session.cycles_in_phase >= self.ejection_cycles {
                    session.enter(TransferPhase::WaitingArrival);
                }
            }
            TransferPhase::WaitingArrival => {
                if inputs.get(Sensor::AtTransfer1) {
                    session.enter(TransferPhase::Releasing);
                } else if self
                    .stall_cycles
                    .is_some_and(|limit| session.cycles_in_phase >= limit)
                {
                    return Err(StallFault {
                        sequence: Sequence::Transfer,
                        phase: "WAITING_ARRIVAL",
                        cycles: session.cycles_in_phase,
                    });
                }
            }
            TransferPhase::Releasing => {
                if session.cycles_in_phase >= self.resume_cycles {
                    session.enter(TransferPhase::Idle);
                }
            }
        }

        Ok(TransferOutputs {
            transfer_left: matches!(
                session.phase,
                TransferPhase::Arming | TransferPhase::WaitingArrival
            ),
            feed_hold: session.phase != TransferPhase::Idle,
        })
    }
}
