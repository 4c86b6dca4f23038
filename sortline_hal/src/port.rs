//! I/O port trait and transport error types.
//!
//! - `IoPort` - one discrete-I/O endpoint (Modbus/TCP, simulation)
//! - `TransportError` - why a bit read or write failed
//! - `PortFactory` - constructor registered in the driver registry
//!
//! Ports move raw bits only. NC/inverted logic is applied by the caller
//! through [`Channel::logical`] and [`Channel::physical`].

use sortline_common::io::registry::Channel;
use sortline_common::line::config::TransportConfig;
use thiserror::Error;

/// Error types for port operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No connection and reconnecting failed.
    #[error("not connected to {0}")]
    NotConnected(String),

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// No response within the configured timeout.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with a protocol exception.
    #[error("exception 0x{code:02X} for function 0x{function:02X}")]
    Exception { function: u8, code: u8 },

    /// Response frame did not match the request.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// Read on a coil or write on a discrete input.
    #[error("channel {address} is {actual}, operation needs {expected}")]
    WrongChannelType {
        address: u16,
        expected: &'static str,
        actual: &'static str,
    },

    /// Fault injected by the simulated port.
    #[error("injected fault at address {0}")]
    Injected(u16),

    /// No driver with this name in the registry.
    #[error("port driver not found: {0}")]
    DriverNotFound(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Factory function type for creating port instances.
pub type PortFactory = fn(&TransportConfig) -> Box<dyn IoPort>;

/// Transfer counters kept by a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortDiagnostics {
    pub reads: u64,
    pub writes: u64,
    pub failures: u64,
    pub reconnects: u64,
}

/// One discrete-I/O endpoint.
///
/// # Lifecycle
///
/// 1. `connect()` - once at startup, may block up to the transport timeout
/// 2. `begin_scan()` - at the start of every scan
/// 3. `read_bit()` / `write_bit()` - every scan, one request per call
/// 4. `close()` - after the shutdown all-off has been written
///
/// Errors are returned, never panicked; the scan loop decides how a failed
/// read or write degrades.
pub trait IoPort: Send {
    /// Driver identifier (e.g. "modbus", "simulation").
    fn name(&self) -> &'static str;

    /// Open the connection.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// A new scan starts. Ports that reconnect lazily reset their
    /// per-scan reconnect budget here.
    /// Default: no-op
    fn begin_scan(&mut self) {}

    /// Read the raw state of a discrete input.
    fn read_bit(&mut self, channel: Channel) -> Result<bool, TransportError>;

    /// Write the raw state of a coil.
    fn write_bit(&mut self, channel: Channel, value: bool) -> Result<(), TransportError>;

    /// Release the connection. Idempotent.
    fn close(&mut self);

    /// Transfer counters.
    /// Default: None
    fn diagnostics(&self) -> Option<PortDiagnostics> {
        None
    }
}

impl<P: IoPort + ?Sized> IoPort for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }
    fn begin_scan(&mut self) {
        (**self).begin_scan()
    }
    fn read_bit(&mut self, channel: Channel) -> Result<bool, TransportError> {
        (**self).read_bit(channel)
    }
    fn write_bit(&mut self, channel: Channel, value: bool) -> Result<(), TransportError> {
        (**self).write_bit(channel, value)
    }
    fn close(&mut self) {
        (**self).close()
    }
    fn diagnostics(&self) -> Option<PortDiagnostics> {
        (**self).diagnostics()
    }
}
