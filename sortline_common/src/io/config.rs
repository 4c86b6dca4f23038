//! I/O configuration structs.
//!
//! Deserialized from `io.toml` at startup. Each group contains an array of
//! discrete I/O points addressed by Modbus bit number.

use serde::{Deserialize, Serialize};

use super::role::{DiLogic, IoPointType};

/// Built-in map of the Factory I/O sorting scene, used when no `io.toml`
/// is supplied.
pub const SCENE_IO_TOML: &str = include_str!("scene_io.toml");

// ─── IoPoint ────────────────────────────────────────────────────────

/// A single I/O point definition from `io.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoPoint {
    /// I/O type discriminator.
    #[serde(rename = "type")]
    pub io_type: IoPointType,

    /// Modbus bit address (discrete input or coil number).
    pub pin: u16,

    /// Functional role string (parsed into `IoRole` at registry construction).
    #[serde(default)]
    pub role: Option<String>,

    /// Factory I/O tag name. Used to bind the point when `role` is absent.
    #[serde(default)]
    pub name: Option<String>,

    /// NO (Normally Open) or NC (Normally Closed). DI only. Default: NO.
    #[serde(default)]
    pub logic: Option<DiLogic>,

    /// Invert logic-to-coil mapping. DO only. Default: false.
    #[serde(default)]
    pub inverted: Option<bool>,
}

// ─── IoGroup ────────────────────────────────────────────────────────

/// A named group of I/O points from `io.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoGroup {
    /// Group display name.
    #[serde(default)]
    pub name: Option<String>,

    /// I/O points in this group.
    pub io: Vec<IoPoint>,
}

// ─── IoConfig ───────────────────────────────────────────────────────

/// Top-level I/O configuration: a map of group keys to `IoGroup`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    #[serde(flatten)]
    pub groups: std::collections::BTreeMap<String, IoGroup>,
}

impl IoConfig {
    /// Parse from TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// The built-in scene map.
    pub fn scene_default() -> Result<Self, toml::de::Error> {
        Self::from_toml(SCENE_IO_TOML)
    }

    /// Iterate all I/O points with their group key.
    pub fn all_points(&self) -> impl Iterator<Item = (&str, usize, &IoPoint)> {
        self.groups.iter().flat_map(|(key, group)| {
            group
                .io
                .iter()
                .enumerate()
                .map(move |(idx, point)| (key.as_str(), idx, point))
        })
    }
}
