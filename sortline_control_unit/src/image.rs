//! Process image: the inputs read and the coils commanded in one scan.
//!
//! Inputs and coils are closed enumerations indexing fixed arrays; the
//! light-curtain beams are kept separately, ordered low to high.

use heapless::Vec as BeamVec;
use sortline_common::consts::MAX_BEAMS;
use sortline_common::io::role::IoRole;
use sortline_common::line::state::{SupervisoryState, TurntablePhase};
use static_assertions::const_assert_eq;

// ─── Sensors ────────────────────────────────────────────────────────

/// Discrete inputs read every scan (beams excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Sensor {
    Start,
    Stop,
    EStop,
    AtEntry1,
    AtTransfer1,
    AtTransfer2,
    AtExit,
    PassThrough,
    LoadPresence,
    TableLimit0,
    TableLimit90,
    TableBack,
    TableFront,
    ExitLeft,
    ExitRight,
}

/// Number of [`Sensor`] variants.
pub const SENSOR_COUNT: usize = 15;

const_assert_eq!(Sensor::ExitRight as usize + 1, SENSOR_COUNT);

impl Sensor {
    pub const ALL: [Sensor; SENSOR_COUNT] = [
        Self::Start,
        Self::Stop,
        Self::EStop,
        Self::AtEntry1,
        Self::AtTransfer1,
        Self::AtTransfer2,
        Self::AtExit,
        Self::PassThrough,
        Self::LoadPresence,
        Self::TableLimit0,
        Self::TableLimit90,
        Self::TableBack,
        Self::TableFront,
        Self::ExitLeft,
        Self::ExitRight,
    ];

    pub const fn role(self) -> IoRole {
        match self {
            Self::Start => IoRole::Start,
            Self::Stop => IoRole::Stop,
            Self::EStop => IoRole::EStop,
            Self::AtEntry1 => IoRole::AtEntry(1),
            Self::AtTransfer1 => IoRole::AtTransfer(1),
            Self::AtTransfer2 => IoRole::AtTransfer(2),
            Self::AtExit => IoRole::AtExit,
            Self::PassThrough => IoRole::PassThrough,
            Self::LoadPresence => IoRole::LoadPresence,
            Self::TableLimit0 => IoRole::TableLimit0,
            Self::TableLimit90 => IoRole::TableLimit90,
            Self::TableBack => IoRole::TableBack,
            Self::TableFront => IoRole::TableFront,
            Self::ExitLeft => IoRole::ExitLeft,
            Self::ExitRight => IoRole::ExitRight,
        }
    }
}

// ─── Coils ──────────────────────────────────────────────────────────

/// Coils written every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Coil {
    Conveyor1,
    Conveyor2,
    Load1,
    Load2,
    /// Scene part "Roller 4m 0".
    Roller4m0,
    /// Scene part "Roller 4m 3".
    Roller4m3,
    /// Scene part "Roller 6m 1", the roller feeding the turntable. Held
    /// with the table feed while the table is occupied.
    Roller6m1,
    Emitter1,
    Emitter2,
    TransferLeft1,
    TransferLeft2,
    TableTurn,
    TableRollPlus,
    TableRollMinus,
    LightRed,
    LightGreen,
    LightYellow,
}

/// Number of [`Coil`] variants.
pub const COIL_COUNT: usize = 17;

const_assert_eq!(Coil::LightYellow as usize + 1, COIL_COUNT);

impl Coil {
    pub const ALL: [Coil; COIL_COUNT] = [
        Self::Conveyor1,
        Self::Conveyor2,
        Self::Load1,
        Self::Load2,
        Self::Roller4m0,
        Self::Roller4m3,
        Self::Roller6m1,
        Self::Emitter1,
        Self::Emitter2,
        Self::TransferLeft1,
        Self::TransferLeft2,
        Self::TableTurn,
        Self::TableRollPlus,
        Self::TableRollMinus,
        Self::LightRed,
        Self::LightGreen,
        Self::LightYellow,
    ];

    /// Conveyors, loaders, rollers and emitters.
    pub const FEED_BANK: [Coil; 9] = [
        Self::Conveyor1,
        Self::Conveyor2,
        Self::Load1,
        Self::Load2,
        Self::Roller4m0,
        Self::Roller4m3,
        Self::Roller6m1,
        Self::Emitter1,
        Self::Emitter2,
    ];

    pub const fn role(self) -> IoRole {
        match self {
            Self::Conveyor1 => IoRole::Conveyor(1),
            Self::Conveyor2 => IoRole::Conveyor(2),
            Self::Load1 => IoRole::Load(1),
            Self::Load2 => IoRole::Load(2),
            Self::Roller4m0 => IoRole::Roller(1),
            Self::Roller4m3 => IoRole::Roller(2),
            Self::Roller6m1 => IoRole::Roller(3),
            Self::Emitter1 => IoRole::Emitter(1),
            Self::Emitter2 => IoRole::Emitter(2),
            Self::TransferLeft1 => IoRole::TransferLeft(1),
            Self::TransferLeft2 => IoRole::TransferLeft(2),
            Self::TableTurn => IoRole::TableTurn,
            Self::TableRollPlus => IoRole::TableRollPlus,
            Self::TableRollMinus => IoRole::TableRollMinus,
            Self::LightRed => IoRole::LightRed,
            Self::LightGreen => IoRole::LightGreen,
            Self::LightYellow => IoRole::LightYellow,
        }
    }
}

// ─── InputImage ─────────────────────────────────────────────────────

/// Logical input levels for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputImage {
    sensors: [bool; SENSOR_COUNT],
    /// Beam levels, lowest beam first.
    pub beams: BeamVec<bool, MAX_BEAMS>,
}

impl InputImage {
    #[inline]
    pub fn get(&self, sensor: Sensor) -> bool {
        self.sensors[sensor as usize]
    }

    #[inline]
    pub fn set(&mut self, sensor: Sensor, value: bool) {
        self.sensors[sensor as usize] = value;
    }

    /// Number of beams currently interrupted.
    pub fn blocked_beams(&self) -> u8 {
        self.beams.iter().filter(|b| **b).count() as u8
    }

    /// Set the lowest `n` beams high and the rest low.
    pub fn set_blocked(&mut self, n: usize) {
        self.beams.clear();
        for i in 0..MAX_BEAMS {
            // Capacity is MAX_BEAMS; push cannot fail.
            let _ = self.beams.push(i < n);
        }
    }
}

// ─── OutputImage ────────────────────────────────────────────────────

/// Commanded coil levels for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputImage {
    coils: [bool; COIL_COUNT],
}

impl OutputImage {
    /// Every coil off, stack light dark.
    pub const fn all_off() -> Self {
        Self {
            coils: [false; COIL_COUNT],
        }
    }

    #[inline]
    pub fn get(&self, coil: Coil) -> bool {
        self.coils[coil as usize]
    }

    #[inline]
    pub fn set(&mut self, coil: Coil, value: bool) {
        self.coils[coil as usize] = value;
    }

    /// Every coil currently on.
    pub fn energized(&self) -> impl Iterator<Item = Coil> + '_ {
        Coil::ALL.into_iter().filter(|c| self.get(*c))
    }

    /// Drive the stack light for the current state.
    ///
    /// Stopped = dark, EmergencyStopped = red, running with an empty table
    /// = green, running mid-sequence = yellow.
    pub fn set_stack_light(&mut self, state: SupervisoryState, phase: TurntablePhase) {
        let (red, green, yellow) = match state {
            SupervisoryState::Stopped => (false, false, false),
            SupervisoryState::EmergencyStopped => (true, false, false),
            SupervisoryState::Running if phase.is_ready() => (false, true, false),
            SupervisoryState::Running => (false, false, true),
        };
        self.set(Coil::LightRed, red);
        self.set(Coil::LightGreen, green);
        self.set(Coil::LightYellow, yellow);
    }
}
