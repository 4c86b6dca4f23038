//! Height measurement from the light curtain.
//!
//! While the pass-through sensor is high the accumulator tracks the largest
//! number of simultaneously blocked beams. On its falling edge the maximum
//! is emitted as a [`BoxSizeClass`] and the accumulator resets. A transit
//! that never blocked a beam emits nothing.

use sortline_common::consts::MAX_BEAMS;
use sortline_common::line::state::BoxSizeClass;
use tracing::info;

use super::queue::BoxQueue;

/// Per-box accumulator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeightAccumulator {
    running_max: u8,
    active: bool,
    prev_pass: bool,
}

impl HeightAccumulator {
    pub const fn new() -> Self {
        Self {
            running_max: 0,
            active: false,
            prev_pass: false,
        }
    }

    /// Largest blocked-beam count seen in the current transit.
    #[inline]
    pub const fn running_max(&self) -> u8 {
        self.running_max
    }

    /// A box is currently in the curtain.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one scan. Returns the size class on the falling edge of
    /// `pass_through` when at least one beam was blocked.
    pub fn step(&mut self, pass_through: bool, blocked: u8) -> Option<BoxSizeClass> {
        let falling = self.prev_pass && !pass_through;
        self.prev_pass = pass_through;

        if pass_through {
            self.active = true;
            let blocked = blocked.min(MAX_BEAMS as u8);
            if blocked > self.running_max {
                self.running_max = blocked;
            }
            return None;
        }

        if !falling {
            return None;
        }

        let measured = BoxSizeClass::new(self.running_max);
        self.running_max = 0;
        self.active = false;
        measured
    }

    /// Drop any partial measurement.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Run the accumulator for one scan and enqueue a completed measurement.
pub fn advance(
    acc: &mut HeightAccumulator,
    pass_through: bool,
    blocked: u8,
    queue: &mut BoxQueue,
) -> Option<BoxSizeClass> {
    let measured = acc.step(pass_through, blocked)?;
    queue.push(measured);
    info!("Box measured: size {measured}, {} queued", queue.len());
    Some(measured)
}
