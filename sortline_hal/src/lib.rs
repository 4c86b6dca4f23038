//! # Sortline HAL Library
//!
//! Discrete-I/O ports for the sorting line controller. The control unit
//! talks to the plant only through the [`IoPort`] trait.
//!
//! # Module Structure
//!
//! - [`port`] - `IoPort` trait, `TransportError`
//! - [`driver_registry`] - Port factory registration
//! - [`drivers`] - Modbus/TCP and simulation drivers

pub mod driver_registry;
pub mod drivers;
pub mod port;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::modbus::ModbusTcpPort;
pub use crate::drivers::simulation::SimulatedPort;
pub use crate::port::{IoPort, PortDiagnostics, TransportError};
