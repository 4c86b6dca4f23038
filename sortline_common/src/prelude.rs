//! Common re-exports.
//!
//! ```rust
//! use sortline_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::line::config::{ControlConfig, LineConfig, RoutingConfig, TransportConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_BEAMS, SCAN_INTERVAL_MS_DEFAULT};

// ─── I/O ────────────────────────────────────────────────────────────
pub use crate::io::config::IoConfig;
pub use crate::io::registry::{Channel, IoConfigError, IoRegistry};
pub use crate::io::role::{IoPointType, IoRole};

// ─── Line State ─────────────────────────────────────────────────────
pub use crate::line::state::{
    BoxSizeClass, Direction, SupervisoryState, TransferPhase, TurntablePhase,
};

/// Default scan interval as Duration.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(SCAN_INTERVAL_MS_DEFAULT);
