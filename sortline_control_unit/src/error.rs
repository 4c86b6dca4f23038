//! Error types for the control unit.
//!
//! - [`LineError`] - per-scan fault flags; CRITICAL flags force an emergency stop
//! - [`StallFault`] - a sequence waited too long for its exit sensor
//! - [`ControlError`] - startup failures (configuration, channel resolution)
//! - [`CycleError`] - failures that end the scan loop
//!
//! Transport faults inside a scan never become errors: reads degrade to
//! `false`, failed writes are retried on the next scan.

use bitflags::bitflags;
use sortline_common::config::ConfigError;
use sortline_common::io::registry::IoConfigError;
use sortline_common::io::role::IoRole;
use sortline_hal::port::TransportError;
use thiserror::Error;

bitflags! {
    /// Faults observed during one scan.
    ///
    /// CRITICAL flags (→ EmergencyStopped): TURNTABLE_STALL, TRANSFER_STALL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineError: u8 {
        /// At least one input read failed (read as `false`).
        const READ_FAULT       = 0x01;
        /// At least one coil write failed (retried next scan).
        const WRITE_FAULT      = 0x02;
        /// Turntable sequence stalled. **CRITICAL → EmergencyStopped**.
        const TURNTABLE_STALL  = 0x04;
        /// Transfer sequence stalled. **CRITICAL → EmergencyStopped**.
        const TRANSFER_STALL   = 0x08;
    }
}

impl LineError {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self =
        Self::from_bits_truncate(Self::TURNTABLE_STALL.bits() | Self::TRANSFER_STALL.bits());

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for LineError {
    fn default() -> Self {
        Self::empty()
    }
}

/// Which sequence stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Turntable,
    Transfer,
}

impl Sequence {
    /// Flag raised for a stall of this sequence.
    pub const fn flag(&self) -> LineError {
        match self {
            Self::Turntable => LineError::TURNTABLE_STALL,
            Self::Transfer => LineError::TRANSFER_STALL,
        }
    }
}

/// A sequence phase exceeded its stall timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{sequence:?} stalled in {phase} after {cycles} scans")]
pub struct StallFault {
    pub sequence: Sequence,
    pub phase: &'static str,
    pub cycles: u32,
}

/// Startup failure. Fatal before the scan loop begins.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io.toml: {0}")]
    IoParse(String),

    #[error(transparent)]
    IoConfig(#[from] IoConfigError),

    /// Roles with no channel (ConfigurationFault).
    #[error("missing required roles: {}", format_roles(.0))]
    MissingRoles(Vec<IoRole>),
}

fn format_roles(roles: &[IoRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure that ends the scan loop.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The port could not be opened at startup.
    #[error("transport unavailable: {0}")]
    Transport(#[from] TransportError),
}
