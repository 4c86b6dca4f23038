//! System-wide constants for the sortline workspace.
//!
//! Single source of truth for numeric limits, defaults and paths.

use static_assertions::const_assert;

/// Number of beams in the light curtain.
pub const MAX_BEAMS: usize = 8;

/// Default scan interval [ms].
pub const SCAN_INTERVAL_MS_DEFAULT: u64 = 150;

/// Lower bound for the scan interval [ms].
pub const SCAN_INTERVAL_MS_MIN: u64 = 10;

/// Upper bound for the scan interval [ms].
pub const SCAN_INTERVAL_MS_MAX: u64 = 5_000;

/// Transfer actuators stay on at least this long before arrival is checked [ms].
pub const EJECTION_DELAY_MS_DEFAULT: u64 = 500;

/// Pause after the transfer actuators release, before the feed resumes [ms].
pub const RESUME_DELAY_MS_DEFAULT: u64 = 300;

/// Sequence stall timeout [ms]. `0` disables stall detection.
pub const STALL_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Status snapshot period [cycles].
pub const STATUS_INTERVAL_DEFAULT: u32 = 20;

/// Default Modbus/TCP host.
pub const MODBUS_HOST_DEFAULT: &str = "127.0.0.1";

/// Default Modbus/TCP port.
pub const MODBUS_PORT_DEFAULT: u16 = 502;

/// Default Modbus unit identifier.
pub const MODBUS_UNIT_ID_DEFAULT: u8 = 1;

/// Default transport connect/read timeout [ms].
pub const TRANSPORT_TIMEOUT_MS_DEFAULT: u64 = 500;

/// Default configuration directory path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sortline/config";

/// Main configuration file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// I/O map file name inside the config directory.
pub const IO_FILE_NAME: &str = "io.toml";

// Box size classes are stored as u8.
const_assert!(MAX_BEAMS > 0 && MAX_BEAMS <= u8::MAX as usize);
const_assert!(SCAN_INTERVAL_MS_MIN <= SCAN_INTERVAL_MS_DEFAULT);
const_assert!(SCAN_INTERVAL_MS_DEFAULT <= SCAN_INTERVAL_MS_MAX);
const_assert!(TRANSPORT_TIMEOUT_MS_DEFAULT > 0);
