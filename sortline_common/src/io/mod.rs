//! I/O configuration and role-based channel resolution.
//!
//! Both the HAL and the control unit parse the same `io.toml` at startup.
//! Runtime access is through [`registry::IoRegistry`]; nothing is resolved
//! by string once the scan loop runs.

pub mod config;
pub mod registry;
pub mod role;
pub mod tags;
