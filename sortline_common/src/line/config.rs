//! Line controller configuration (`config.toml`).
//!
//! Every section and field is optional; a missing file yields the
//! defaults of the Factory I/O sorting scene. Call [`LineConfig::validate`]
//! after loading.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    EJECTION_DELAY_MS_DEFAULT, MAX_BEAMS, MODBUS_HOST_DEFAULT, MODBUS_PORT_DEFAULT,
    MODBUS_UNIT_ID_DEFAULT, RESUME_DELAY_MS_DEFAULT, SCAN_INTERVAL_MS_DEFAULT,
    SCAN_INTERVAL_MS_MAX, SCAN_INTERVAL_MS_MIN, STALL_TIMEOUT_MS_DEFAULT,
    STATUS_INTERVAL_DEFAULT, TRANSPORT_TIMEOUT_MS_DEFAULT,
};

use super::state::{BoxSizeClass, Direction};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level line controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl LineConfig {
    /// Run every section's validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.transport.validate()?;
        self.control.validate()?;
        self.routing.validate()?;
        Ok(())
    }
}

// ─── Transport ──────────────────────────────────────────────────────

/// Modbus/TCP endpoint of the simulated plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub unit_id: u8,
    /// Connect and response timeout [ms].
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: MODBUS_HOST_DEFAULT.to_string(),
            port: MODBUS_PORT_DEFAULT,
            unit_id: MODBUS_UNIT_ID_DEFAULT,
            timeout_ms: TRANSPORT_TIMEOUT_MS_DEFAULT,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transport.host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "transport.port must be non-zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "transport.timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Control ────────────────────────────────────────────────────────

/// Scan cadence and sequence timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Scan interval [ms].
    pub scan_interval_ms: u64,
    /// Transfer actuator hold before arrival is checked [ms].
    pub ejection_delay_ms: u64,
    /// Pause between transfer release and feed resume [ms].
    pub resume_delay_ms: u64,
    /// Per-phase stall timeout [ms]. `0` disables.
    pub stall_timeout_ms: u64,
    /// Status snapshot period [cycles]. `0` disables.
    pub status_interval: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: SCAN_INTERVAL_MS_DEFAULT,
            ejection_delay_ms: EJECTION_DELAY_MS_DEFAULT,
            resume_delay_ms: RESUME_DELAY_MS_DEFAULT,
            stall_timeout_ms: STALL_TIMEOUT_MS_DEFAULT,
            status_interval: STATUS_INTERVAL_DEFAULT,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(SCAN_INTERVAL_MS_MIN..=SCAN_INTERVAL_MS_MAX).contains(&self.scan_interval_ms) {
            return Err(ConfigError::ValidationError(format!(
                "control.scan_interval_ms {} outside {SCAN_INTERVAL_MS_MIN}..={SCAN_INTERVAL_MS_MAX}",
                self.scan_interval_ms
            )));
        }
        if self.stall_timeout_ms != 0 && self.stall_timeout_ms < self.scan_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "control.stall_timeout_ms {} shorter than one scan",
                self.stall_timeout_ms
            )));
        }
        Ok(())
    }

    /// Whole scans covering `ms`, rounded up.
    pub fn cycles_for(&self, ms: u64) -> u32 {
        let scan = self.scan_interval_ms.max(1);
        u32::try_from(ms.div_ceil(scan)).unwrap_or(u32::MAX)
    }

    /// Scans spent in the ejection delay.
    pub fn ejection_delay_cycles(&self) -> u32 {
        self.cycles_for(self.ejection_delay_ms)
    }

    /// Scans spent in the resume delay.
    pub fn resume_delay_cycles(&self) -> u32 {
        self.cycles_for(self.resume_delay_ms)
    }

    /// Scans after which a waiting phase counts as stalled.
    pub fn stall_cycles(&self) -> Option<u32> {
        (self.stall_timeout_ms != 0).then(|| self.cycles_for(self.stall_timeout_ms))
    }
}

// ─── Routing ────────────────────────────────────────────────────────

/// Box size → ejection side partition.
///
/// ```toml
/// [routing]
/// right = [1, 2]
/// left = [3, 4]
/// fallback = "left"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Inclusive size range ejected to the right.
    pub right: [u8; 2],
    /// Inclusive size range ejected to the left.
    pub left: [u8; 2],
    /// Side used when the size is absent or in neither range.
    pub fallback: Direction,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            right: [1, 2],
            left: [3, 4],
            fallback: Direction::Left,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, [lo, hi]) in [("right", self.right), ("left", self.left)] {
            if lo == 0 || lo > hi || hi as usize > MAX_BEAMS {
                return Err(ConfigError::ValidationError(format!(
                    "routing.{name} = [{lo}, {hi}] is not a range within 1..={MAX_BEAMS}"
                )));
            }
        }
        let [rl, rh] = self.right;
        let [ll, lh] = self.left;
        if rl <= lh && ll <= rh {
            return Err(ConfigError::ValidationError(format!(
                "routing ranges overlap: right = [{rl}, {rh}], left = [{ll}, {lh}]"
            )));
        }
        Ok(())
    }

    /// Configured side for `size`, or `None` if no range matches.
    pub fn direction_for(&self, size: Option<BoxSizeClass>) -> Option<Direction> {
        let n = size?.get();
        let within = |[lo, hi]: [u8; 2]| (lo..=hi).contains(&n);
        if within(self.right) {
            Some(Direction::Right)
        } else if within(self.left) {
            Some(Direction::Left)
        } else {
            None
        }
    }
}
