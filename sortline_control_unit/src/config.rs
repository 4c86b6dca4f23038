//! Configuration directory loading.
//!
//! `<dir>/config.toml` → [`LineConfig`], `<dir>/io.toml` → [`IoRegistry`].
//! Either file may be absent: the line defaults and the built-in scene map
//! are used instead. A file that exists but does not parse is fatal.

use std::path::{Path, PathBuf};

use sortline_common::config::{ConfigError, ConfigLoader};
use sortline_common::consts::{CONFIG_FILE_NAME, DEFAULT_CONFIG_PATH, IO_FILE_NAME};
use sortline_common::io::config::IoConfig;
use sortline_common::io::registry::IoRegistry;
use sortline_common::line::config::LineConfig;
use tracing::info;

use crate::error::ControlError;

/// Validated configuration bundle, ready for runtime use.
#[derive(Debug)]
pub struct LoadedConfig {
    pub line: LineConfig,
    pub registry: IoRegistry,
}

/// Load `config.toml` and `io.toml` from `dir` (default `/etc/sortline/config`).
pub fn load_config_dir(dir: Option<&Path>) -> Result<LoadedConfig, ControlError> {
    let dir: PathBuf = dir.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), Path::to_path_buf);

    let config_path = dir.join(CONFIG_FILE_NAME);
    let line = match LineConfig::load_optional(&config_path)? {
        Some(line) => {
            info!("Loaded {}", config_path.display());
            line
        }
        None => {
            info!("{} not found, using defaults", config_path.display());
            LineConfig::default()
        }
    };
    line.validate()?;

    let io_path = dir.join(IO_FILE_NAME);
    let io = match IoConfig::load_optional(&io_path) {
        Ok(Some(io)) => {
            info!("Loaded {}", io_path.display());
            io
        }
        Ok(None) => {
            info!("{} not found, using built-in scene map", io_path.display());
            IoConfig::scene_default().map_err(|e| ControlError::IoParse(e.to_string()))?
        }
        Err(ConfigError::ParseError(e)) => {
            return Err(ControlError::IoParse(format!("{}: {e}", io_path.display())));
        }
        Err(e) => return Err(e.into()),
    };
    let registry = IoRegistry::from_config(&io)?;

    Ok(LoadedConfig { line, registry })
}

/// Build a bundle from TOML strings (for testing).
pub fn load_config_from_strings(
    config_toml: &str,
    io_toml: &str,
) -> Result<LoadedConfig, ControlError> {
    let line = LineConfig::from_toml_str(config_toml)?;
    line.validate()?;
    let io = IoConfig::from_toml(io_toml).map_err(|e| ControlError::IoParse(e.to_string()))?;
    let registry = IoRegistry::from_config(&io)?;
    Ok(LoadedConfig { line, registry })
}
