//! In-memory port for development and testing.
//!
//! Holds one bit per discrete input and per coil. Inputs are set from
//! outside (tests, or a scene model); coils record what the controller
//! wrote. Read and write faults can be injected per address.

use std::collections::{BTreeMap, BTreeSet};

use sortline_common::io::registry::Channel;
use sortline_common::io::role::IoPointType;
use sortline_common::line::config::TransportConfig;
use tracing::trace;

use crate::port::{IoPort, PortDiagnostics, TransportError};

/// Simulated discrete-I/O device.
#[derive(Debug, Default)]
pub struct SimulatedPort {
    inputs: BTreeMap<u16, bool>,
    coils: BTreeMap<u16, bool>,
    read_faults: BTreeSet<u16>,
    write_faults: BTreeSet<u16>,
    connected: bool,
    scans: u64,
    diag: PortDiagnostics,
}

impl SimulatedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw level of a discrete input.
    pub fn set_input(&mut self, address: u16, raw: bool) {
        self.inputs.insert(address, raw);
    }

    /// Set a channel to its logical value, honouring NC inversion.
    pub fn set_logical(&mut self, channel: Channel, value: bool) {
        self.set_input(channel.address, channel.physical(value));
    }

    /// Last raw value written to a coil (`false` if never written).
    pub fn coil(&self, address: u16) -> bool {
        self.coils.get(&address).copied().unwrap_or(false)
    }

    /// Logical state of a coil channel.
    pub fn coil_logical(&self, channel: Channel) -> bool {
        channel.logical(self.coil(channel.address))
    }

    /// Addresses of every coil currently on.
    pub fn coils_on(&self) -> Vec<u16> {
        self.coils
            .iter()
            .filter_map(|(addr, on)| on.then_some(*addr))
            .collect()
    }

    /// Make reads of `address` fail until cleared.
    pub fn fail_reads(&mut self, address: u16) {
        self.read_faults.insert(address);
    }

    /// Make writes to `address` fail until cleared.
    pub fn fail_writes(&mut self, address: u16) {
        self.write_faults.insert(address);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&mut self) {
        self.read_faults.clear();
        self.write_faults.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Successful coil writes so far.
    pub fn write_count(&self) -> u64 {
        self.diag.writes
    }

    /// Scans announced through `begin_scan`.
    pub fn scan_count(&self) -> u64 {
        self.scans
    }
}

impl IoPort for SimulatedPort {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn begin_scan(&mut self) {
        self.scans += 1;
    }

    fn read_bit(&mut self, channel: Channel) -> Result<bool, TransportError> {
        if channel.io_type != IoPointType::Di {
            return Err(TransportError::WrongChannelType {
                address: channel.address,
                expected: "di",
                actual: "do",
            });
        }
        if self.read_faults.contains(&channel.address) {
            self.diag.failures += 1;
            return Err(TransportError::Injected(channel.address));
        }
        self.diag.reads += 1;
        Ok(self.inputs.get(&channel.address).copied().unwrap_or(false))
    }

    fn write_bit(&mut self, channel: Channel, value: bool) -> Result<(), TransportError> {
        if channel.io_type != IoPointType::Do {
            return Err(TransportError::WrongChannelType {
                address: channel.address,
                expected: "do",
                actual: "di",
            });
        }
        if self.write_faults.contains(&channel.address) {
            self.diag.failures += 1;
            return Err(TransportError::Injected(channel.address));
        }
        trace!("sim coil {} <- {}", channel.address, value);
        self.coils.insert(channel.address, value);
        self.diag.writes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn diagnostics(&self) -> Option<PortDiagnostics> {
        Some(self.diag)
    }
}

/// Factory for the driver registry.
pub fn create_port(_config: &TransportConfig) -> Box<dyn IoPort> {
    Box::new(SimulatedPort::new())
}
