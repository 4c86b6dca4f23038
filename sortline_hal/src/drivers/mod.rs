//! Port driver implementations.
//!
//! - [`modbus`] - Modbus/TCP client for the Factory I/O server
//! - [`simulation`] - In-memory port for development and testing

pub mod modbus;
pub mod simulation;
