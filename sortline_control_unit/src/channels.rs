//! Startup channel resolution.
//!
//! Every sensor, beam and coil the scan touches is resolved to a
//! [`Channel`] once, before the loop starts. A role without a channel is a
//! configuration fault; nothing is looked up by role afterwards.

use heapless::Vec as BeamVec;
use sortline_common::consts::MAX_BEAMS;
use sortline_common::io::registry::{Channel, IoConfigError, IoRegistry};
use sortline_common::io::role::IoRole;
use tracing::info;

use crate::error::ControlError;
use crate::image::{COIL_COUNT, Coil, SENSOR_COUNT, Sensor};

/// Resolved channels, immutable for the life of the run.
#[derive(Debug, Clone)]
pub struct ChannelMap {
    sensors: [Channel; SENSOR_COUNT],
    /// Beam channels, lowest beam first.
    beams: BeamVec<Channel, MAX_BEAMS>,
    coils: [Channel; COIL_COUNT],
}

impl ChannelMap {
    /// Resolve every role the line uses.
    ///
    /// Fails with [`ControlError::MissingRoles`] listing all unresolved roles.
    pub fn from_registry(registry: &IoRegistry) -> Result<Self, ControlError> {
        if let Err(errors) = registry.validate_roles(&IoRole::line_roles()) {
            let missing = errors
                .into_iter()
                .filter_map(|e| match e {
                    IoConfigError::RoleMissing { role } => Some(role),
                    _ => None,
                })
                .collect();
            return Err(ControlError::MissingRoles(missing));
        }

        let lookup = |role: IoRole| {
            registry
                .channel(&role)
                .ok_or_else(|| ControlError::MissingRoles(vec![role]))
        };

        let mut sensors = [Channel::di(0); SENSOR_COUNT];
        for sensor in Sensor::ALL {
            sensors[sensor as usize] = lookup(sensor.role())?;
        }

        let mut beams = BeamVec::new();
        for n in 1..=MAX_BEAMS as u8 {
            // Capacity is MAX_BEAMS; push cannot fail.
            let _ = beams.push(lookup(IoRole::Beam(n))?);
        }

        let mut coils = [Channel::coil(0); COIL_COUNT];
        for coil in Coil::ALL {
            coils[coil as usize] = lookup(coil.role())?;
        }

        info!(
            "Channels resolved: {} sensors, {} beams, {} coils",
            SENSOR_COUNT,
            beams.len(),
            COIL_COUNT
        );
        Ok(Self {
            sensors,
            beams,
            coils,
        })
    }

    #[inline]
    pub fn sensor(&self, sensor: Sensor) -> Channel {
        self.sensors[sensor as usize]
    }

    #[inline]
    pub fn beams(&self) -> &[Channel] {
        &self.beams
    }

    #[inline]
    pub fn coil(&self, coil: Coil) -> Channel {
        self.coils[coil as usize]
    }
}
