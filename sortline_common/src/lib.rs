//! Sortline Common Library
//!
//! Shared types for the sortline workspace: I/O roles and the `io.toml`
//! registry, configuration loading, line state enums and constants.
//!
//! # Module Structure
//!
//! - [`io`] - Role-based I/O configuration and channel resolution
//! - [`line`] - Supervisory/turntable/transfer state and `config.toml`
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! sortline_common = { path = "../sortline_common" }
//! ```

pub mod config;
pub mod consts;
pub mod io;
pub mod line;
pub mod prelude;
