//! I/O Role types.
//!
//! `IoRole` maps a string like `"Beam3"` or `"TableFront"` to a typed enum
//! variant, with index extraction for numbered stations. The set of roles is
//! closed: the line layout is fixed, so an unknown role string is an error
//! rather than a project-specific extension.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_BEAMS;

// ─── IoPointType ────────────────────────────────────────────────────

/// I/O point type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum IoPointType {
    /// Discrete input (Modbus discrete input).
    Di = 0,
    /// Discrete output (Modbus coil).
    Do = 1,
}

impl fmt::Display for IoPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Di => write!(f, "di"),
            Self::Do => write!(f, "do"),
        }
    }
}

impl FromStr for IoPointType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "di" => Ok(Self::Di),
            "do" => Ok(Self::Do),
            _ => Err(format!("unknown IoPointType: {s:?}")),
        }
    }
}

// ─── DiLogic ────────────────────────────────────────────────────────

/// Digital input logic interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum DiLogic {
    /// Normally Open: true when signal present.
    #[serde(rename = "NO")]
    #[default]
    NO = 0,
    /// Normally Closed: inverted.
    #[serde(rename = "NC")]
    NC = 1,
}

impl FromStr for DiLogic {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO" => Ok(Self::NO),
            "NC" => Ok(Self::NC),
            _ => Err(format!("unknown DiLogic: {s:?}, expected \"NO\" or \"NC\"")),
        }
    }
}

// ─── IoRole ─────────────────────────────────────────────────────────

/// Functional I/O role of one channel on the sorting line.
///
/// Numbered roles carry a 1-based station index (`Conveyor(2)` is line 2's
/// conveyor, `Beam(1)` the lowest light-curtain beam).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IoRole {
    // ── Operator buttons ────────────
    Start,
    Stop,
    EStop,

    // ── Line sensors ────────────────
    AtEntry(u8),
    AtTransfer(u8),
    AtExit,

    // ── Height measurement ──────────
    PassThrough,
    Beam(u8),

    // ── Turntable sensors ───────────
    LoadPresence,
    TableLimit0,
    TableLimit90,
    TableBack,
    TableFront,
    ExitLeft,
    ExitRight,

    // ── Feed bank coils ─────────────
    Conveyor(u8),
    Load(u8),
    /// `Roller1` = "Roller 4m 0", `Roller2` = "Roller 4m 3",
    /// `Roller3` = "Roller 6m 1" (feeds the turntable).
    Roller(u8),
    Emitter(u8),

    // ── Transfer coils ──────────────
    TransferLeft(u8),

    // ── Turntable coils ─────────────
    TableTurn,
    TableRollPlus,
    TableRollMinus,

    // ── Stack light ─────────────────
    LightRed,
    LightGreen,
    LightYellow,
}

impl IoRole {
    /// Return the station index if this is a numbered role, else `None`.
    pub fn index(&self) -> Option<u8> {
        match self {
            Self::AtEntry(n)
            | Self::AtTransfer(n)
            | Self::Beam(n)
            | Self::Conveyor(n)
            | Self::Load(n)
            | Self::Roller(n)
            | Self::Emitter(n)
            | Self::TransferLeft(n) => Some(*n),
            _ => None,
        }
    }

    /// Expected I/O type for the role (V-IO-3).
    pub fn expected_io_type(&self) -> IoPointType {
        match self {
            Self::Start
            | Self::Stop
            | Self::EStop
            | Self::AtEntry(_)
            | Self::AtTransfer(_)
            | Self::AtExit
            | Self::PassThrough
            | Self::Beam(_)
            | Self::LoadPresence
            | Self::TableLimit0
            | Self::TableLimit90
            | Self::TableBack
            | Self::TableFront
            | Self::ExitLeft
            | Self::ExitRight => IoPointType::Di,

            Self::Conveyor(_)
            | Self::Load(_)
            | Self::Roller(_)
            | Self::Emitter(_)
            | Self::TransferLeft(_)
            | Self::TableTurn
            | Self::TableRollPlus
            | Self::TableRollMinus
            | Self::LightRed
            | Self::LightGreen
            | Self::LightYellow => IoPointType::Do,
        }
    }

    /// Every role the control unit reads or writes. All of them must resolve
    /// to a channel before the scan loop may start.
    pub fn line_roles() -> Vec<IoRole> {
        let mut roles = vec![
            Self::Start,
            Self::Stop,
            Self::EStop,
            Self::AtEntry(1),
            Self::AtTransfer(1),
            Self::AtTransfer(2),
            Self::AtExit,
            Self::PassThrough,
        ];
        roles.extend((1..=MAX_BEAMS as u8).map(Self::Beam));
        roles.extend([
            Self::LoadPresence,
            Self::TableLimit0,
            Self::TableLimit90,
            Self::TableBack,
            Self::TableFront,
            Self::ExitLeft,
            Self::ExitRight,
            Self::Conveyor(1),
            Self::Conveyor(2),
            Self::Load(1),
            Self::Load(2),
            Self::Roller(1),
            Self::Roller(2),
            Self::Roller(3),
            Self::Emitter(1),
            Self::Emitter(2),
            Self::TransferLeft(1),
            Self::TransferLeft(2),
            Self::TableTurn,
            Self::TableRollPlus,
            Self::TableRollMinus,
            Self::LightRed,
            Self::LightGreen,
            Self::LightYellow,
        ]);
        roles
    }

    /// Factory I/O tag names this role is known under in the scene.
    ///
    /// Used to bind points that only carry a tag `name` in `io.toml`.
    pub fn tag_aliases(&self) -> Vec<String> {
        match self {
            Self::Start => vec!["Start".into()],
            Self::Stop => vec!["Stop".into()],
            // The scene wires its "Reset" button as the emergency stop.
            Self::EStop => vec!["Emergency Stop".into(), "Reset".into()],
            Self::AtEntry(n) => vec![format!("At entry {n}")],
            Self::AtTransfer(n) => vec![format!("At transfer {n}")],
            Self::AtExit => vec!["At exit".into()],
            Self::PassThrough => vec!["Diffuse Sensor 0".into()],
            Self::Beam(n) => vec![format!("Beam {n}")],
            Self::LoadPresence => vec!["Diffuse Sensor 10".into()],
            Self::ExitLeft => vec!["Diffuse Sensor 11".into()],
            Self::ExitRight => vec!["Diffuse Sensor 12".into()],
            Self::TableLimit0 => vec!["Turntable 0 (Limit 0)".into()],
            Self::TableLimit90 => vec!["Turntable 0 (Limit 90)".into()],
            Self::TableBack => vec!["Turntable 0 (Back Limit)".into()],
            Self::TableFront => vec!["Turntable 0 (Front Limit)".into()],
            Self::Conveyor(n) => vec![format!("Conveyor {n}")],
            Self::Load(n) => vec![format!("Load {n}")],
            Self::Roller(1) => vec!["Roller 4m 0".into()],
            Self::Roller(2) => vec!["Roller 4m 3".into()],
            Self::Roller(3) => vec!["Roller 6m 1".into()],
            Self::Roller(n) => vec![format!("Roller {n}")],
            Self::Emitter(n) => vec![format!("Emitter {n}")],
            Self::TransferLeft(n) => vec![format!("Transfer Left {n}")],
            Self::TableTurn => vec!["Turntable 0 Turn".into()],
            Self::TableRollPlus => vec!["Turntable 0 Roll (+)".into()],
            Self::TableRollMinus => vec!["Turntable 0 Roll (-)".into()],
            Self::LightRed => vec!["Stack Light 2 (Red)".into()],
            Self::LightGreen => vec!["Stack Light 2 (Green)".into()],
            Self::LightYellow => vec!["Stack Light 2 (Yellow)".into()],
        }
    }
}

// ─── Role String Parser ─────────────────────────────────────────────

/// Split a role string into (prefix, optional_index).
///
/// `"Beam3"`   → `("Beam", Some(3))`
/// `"AtExit"`  → `("AtExit", None)`
fn split_role_str(s: &str) -> (&str, Option<u8>) {
    let digit_start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    match digit_start {
        Some(i) if i > 0 => match s[i..].parse::<u8>() {
            Ok(n) => (&s[..i], Some(n)),
            Err(_) => (s, None),
        },
        _ => (s, None),
    }
}

impl FromStr for IoRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, index) = split_role_str(s);

        if index.is_none() {
            let role = match prefix {
                "Start" => Some(Self::Start),
                "Stop" => Some(Self::Stop),
                "EStop" => Some(Self::EStop),
                "AtExit" => Some(Self::AtExit),
                "PassThrough" => Some(Self::PassThrough),
                "LoadPresence" => Some(Self::LoadPresence),
                "TableBack" => Some(Self::TableBack),
                "TableFront" => Some(Self::TableFront),
                "ExitLeft" => Some(Self::ExitLeft),
                "ExitRight" => Some(Self::ExitRight),
                "TableTurn" => Some(Self::TableTurn),
                "TableRollPlus" => Some(Self::TableRollPlus),
                "TableRollMinus" => Some(Self::TableRollMinus),
                "LightRed" => Some(Self::LightRed),
                "LightGreen" => Some(Self::LightGreen),
                "LightYellow" => Some(Self::LightYellow),
                _ => None,
            };
            if let Some(role) = role {
                return Ok(role);
            }
        }

        // "TableLimit0"/"TableLimit90" end in digits, so they are matched on
        // the full string before the numbered roles.
        match s {
            "TableLimit0" => return Ok(Self::TableLimit0),
            "TableLimit90" => return Ok(Self::TableLimit90),
            _ => {}
        }

        if let Some(n) = index {
            if n == 0 {
                return Err(format!("role index must be 1-based: {s:?}"));
            }
            match prefix {
                "AtEntry" => return Ok(Self::AtEntry(n)),
                "AtTransfer" => return Ok(Self::AtTransfer(n)),
                "Beam" if (n as usize) <= MAX_BEAMS => return Ok(Self::Beam(n)),
                "Beam" => return Err(format!("beam index {n} exceeds {MAX_BEAMS}")),
                "Conveyor" => return Ok(Self::Conveyor(n)),
                "Load" => return Ok(Self::Load(n)),
                "Roller" => return Ok(Self::Roller(n)),
                "Emitter" => return Ok(Self::Emitter(n)),
                "TransferLeft" => return Ok(Self::TransferLeft(n)),
                _ => {}
            }
        }

        Err(format!("unknown IoRole: {s:?}"))
    }
}

impl fmt::Display for IoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Stop => write!(f, "Stop"),
            Self::EStop => write!(f, "EStop"),
            Self::AtEntry(n) => write!(f, "AtEntry{n}"),
            Self::AtTransfer(n) => write!(f, "AtTransfer{n}"),
            Self::AtExit => write!(f, "AtExit"),
            Self::PassThrough => write!(f, "PassThrough"),
            Self::Beam(n) => write!(f, "Beam{n}"),
            Self::LoadPresence => write!(f, "LoadPresence"),
            Self::TableLimit0 => write!(f, "TableLimit0"),
            Self::TableLimit90 => write!(f, "TableLimit90"),
            Self::TableBack => write!(f, "TableBack"),
            Self::TableFront => write!(f, "TableFront"),
            Self::ExitLeft => write!(f, "ExitLeft"),
            Self::ExitRight => write!(f, "ExitRight"),
            Self::Conveyor(n) => write!(f, "Conveyor{n}"),
            Self::Load(n) => write!(f, "Load{n}"),
            Self::Roller(n) => write!(f, "Roller{n}"),
            Self::Emitter(n) => write!(f, "Emitter{n}"),
            Self::TransferLeft(n) => write!(f, "TransferLeft{n}"),
            Self::TableTurn => write!(f, "TableTurn"),
            Self::TableRollPlus => write!(f, "TableRollPlus"),
            Self::TableRollMinus => write!(f, "TableRollMinus"),
            Self::LightRed => write!(f, "LightRed"),
            Self::LightGreen => write!(f, "LightGreen"),
            Self::LightYellow => write!(f, "LightYellow"),
        }
    }
}
