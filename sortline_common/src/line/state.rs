//! State enums for the sorting line.
//!
//! Global supervisory state, the turntable and transfer sequence phases,
//! and the values they carry. All enums are `#[repr(u8)]` so they can be
//! logged and compared as plain codes.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_BEAMS;

// ─── Supervisory State ──────────────────────────────────────────────

/// Line-wide run state, changed only by button edges or a stall fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SupervisoryState {
    /// Initial state after boot. All actuators off.
    #[default]
    Stopped = 0,
    /// Production running; subsystems step every scan.
    Running = 1,
    /// Emergency stop latched. Left only by a Start edge.
    EmergencyStopped = 2,
}

impl SupervisoryState {
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for SupervisoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "STOPPED"),
            Self::Running => write!(f, "RUNNING"),
            Self::EmergencyStopped => write!(f, "EMERGENCY_STOPPED"),
        }
    }
}

// ─── Turntable Phase ────────────────────────────────────────────────

/// Turntable sequence phase.
///
/// `Idle → Loading → Positioned → Rotating → Ejecting → Returning → Idle`.
/// No terminal phase; the cycle repeats while the line runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TurntablePhase {
    /// Waiting for a box at the load-presence sensor.
    #[default]
    Idle = 0,
    /// Rolling the box onto the table.
    Loading = 1,
    /// Box seated against the front limit.
    Positioned = 2,
    /// Table turning towards 90°.
    Rotating = 3,
    /// Table at 90°, rolling the box off.
    Ejecting = 4,
    /// Table returning to 0° under passive force.
    Returning = 5,
}

impl TurntablePhase {
    /// The table is empty and at 0°.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Idle | Self::Loading)
    }
}

impl fmt::Display for TurntablePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Loading => "LOADING",
            Self::Positioned => "POSITIONED",
            Self::Rotating => "ROTATING",
            Self::Ejecting => "EJECTING",
            Self::Returning => "RETURNING",
        };
        f.write_str(s)
    }
}

// ─── Transfer Phase ─────────────────────────────────────────────────

/// Line 2 → line 1 transfer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TransferPhase {
    /// Guard not satisfied or nothing waiting.
    #[default]
    Idle = 0,
    /// Transfer actuators on, ejection delay running.
    Arming = 1,
    /// Waiting for the line-1 transfer sensor.
    WaitingArrival = 2,
    /// Actuators released, resume delay running.
    Releasing = 3,
}

impl TransferPhase {
    /// No box is crossing between the lines.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Arming => "ARMING",
            Self::WaitingArrival => "WAITING_ARRIVAL",
            Self::Releasing => "RELEASING",
        };
        f.write_str(s)
    }
}

// ─── Direction ──────────────────────────────────────────────────────

/// Turntable ejection side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    /// Roll (−), exit sensor on the left line.
    Left = 0,
    /// Roll (+), exit sensor on the right line.
    Right = 1,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

// ─── BoxSizeClass ───────────────────────────────────────────────────

/// Height class of one box: the largest number of beams it blocked at once.
///
/// Always in `1..=MAX_BEAMS`; a box that blocked nothing has no class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BoxSizeClass(u8);

impl BoxSizeClass {
    /// `None` for `0` or more than `MAX_BEAMS`.
    pub const fn new(blocked: u8) -> Option<Self> {
        if blocked == 0 || blocked as usize > MAX_BEAMS {
            None
        } else {
            Some(Self(blocked))
        }
    }

    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for BoxSizeClass {
    type Error = String;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("box size {value} outside 1..={MAX_BEAMS}"))
    }
}

impl From<BoxSizeClass> for u8 {
    fn from(size: BoxSizeClass) -> Self {
        size.0
    }
}

impl fmt::Display for BoxSizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
