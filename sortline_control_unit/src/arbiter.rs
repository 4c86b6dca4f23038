//! Feed bank arbitration.
//!
//! Conveyors, loaders, rollers and emitters are shared between the
//! supervisor (blanket on while running), the turntable (holds the
//! conveyors feeding the table while it is occupied) and the transfer
//! interlock (holds line 1/2 conveyors and emitters while a box crosses).
//! Holds only ever switch coils off; each coil is resolved once per scan by
//! the highest-priority owner that claims it:
//!
//! `Shutdown > Turntable > Transfer > Supervisor`

use crate::image::{Coil, OutputImage};

/// Who decided a feed coil's level this scan, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedOwner {
    /// Stopped or emergency-stopped: everything off.
    Shutdown,
    /// Turntable occupied.
    Turntable,
    /// Transfer in progress.
    Transfer,
    /// Default-on while running.
    Supervisor,
}

/// Coils held off while the turntable is occupied.
pub const TURNTABLE_HOLD: [Coil; 4] = [Coil::Conveyor1, Coil::Conveyor2, Coil::Load1, Coil::Roller6m1];

/// Coils held off while a transfer is in progress.
pub const TRANSFER_HOLD: [Coil; 4] = [
    Coil::Conveyor1,
    Coil::Conveyor2,
    Coil::Emitter1,
    Coil::Emitter2,
];

/// Per-scan feed requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedArbiter {
    pub running: bool,
    pub turntable_hold: bool,
    pub transfer_hold: bool,
}

impl FeedArbiter {
    /// Owner of `coil` for the current requests.
    pub fn owner(&self, coil: Coil) -> FeedOwner {
        if !self.running {
            FeedOwner::Shutdown
        } else if self.turntable_hold && TURNTABLE_HOLD.contains(&coil) {
            FeedOwner::Turntable
        } else if self.transfer_hold && TRANSFER_HOLD.contains(&coil) {
            FeedOwner::Transfer
        } else {
            FeedOwner::Supervisor
        }
    }

    /// Resolved level of `coil`.
    #[inline]
    pub fn enabled(&self, coil: Coil) -> bool {
        self.owner(coil) == FeedOwner::Supervisor
    }

    /// Write the whole feed bank into `out`.
    pub fn apply(&self, out: &mut OutputImage) {
        for coil in Coil::FEED_BANK {
            out.set(coil, self.enabled(coil));
        }
    }
}
