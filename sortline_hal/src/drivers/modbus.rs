//! Modbus/TCP port driver.
//!
//! Protocol-only: each `read_bit`/`write_bit` is exactly one request and one
//! response. Discrete inputs are read with function 0x02, coils written with
//! function 0x05. After a socket fault the connection is dropped and the next
//! call makes a single reconnect attempt bounded by the transport timeout.
//! At most one reconnect is attempted per scan; once it has failed, the
//! remaining calls of that scan fail immediately.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use sortline_common::io::registry::Channel;
use sortline_common::io::role::IoPointType;
use sortline_common::line::config::TransportConfig;
use tracing::{debug, info, warn};

use crate::port::{IoPort, PortDiagnostics, TransportError};

/// Read Discrete Inputs.
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;
/// Write Single Coil.
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;

const MBAP_LEN: usize = 7;
const PROTOCOL_ID: u16 = 0;
const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;
/// Largest PDU allowed by the Modbus application protocol.
const MAX_PDU_LEN: usize = 253;

// ─── Codec ──────────────────────────────────────────────────────────

/// A 12-byte request: MBAP header plus a 5-byte PDU.
pub type Frame = [u8; 12];

fn frame(transaction: u16, unit_id: u8, function: u8, a: u16, b: u16) -> Frame {
    let mut f = [0u8; 12];
    f[0..2].copy_from_slice(&transaction.to_be_bytes());
    f[2..4].copy_from_slice(&PROTOCOL_ID.to_be_bytes());
    // Length counts the unit id and the PDU.
    f[4..6].copy_from_slice(&6u16.to_be_bytes());
    f[6] = unit_id;
    f[7] = function;
    f[8..10].copy_from_slice(&a.to_be_bytes());
    f[10..12].copy_from_slice(&b.to_be_bytes());
    f
}

/// Encode a single-bit discrete input read.
pub fn encode_read_input(transaction: u16, unit_id: u8, address: u16) -> Frame {
    frame(transaction, unit_id, FC_READ_DISCRETE_INPUTS, address, 1)
}

/// Encode a single coil write.
pub fn encode_write_coil(transaction: u16, unit_id: u8, address: u16, on: bool) -> Frame {
    let value = if on { COIL_ON } else { COIL_OFF };
    frame(transaction, unit_id, FC_WRITE_SINGLE_COIL, address, value)
}

/// Validate an MBAP header against the request; returns the PDU length.
pub fn decode_header(
    header: &[u8; MBAP_LEN],
    transaction: u16,
    unit_id: u8,
) -> Result<usize, TransportError> {
    let tid = u16::from_be_bytes([header[0], header[1]]);
    let pid = u16::from_be_bytes([header[2], header[3]]);
    let len = u16::from_be_bytes([header[4], header[5]]) as usize;
    if tid != transaction {
        return Err(TransportError::Protocol(format!(
            "transaction id {tid}, expected {transaction}"
        )));
    }
    if pid != PROTOCOL_ID {
        return Err(TransportError::Protocol(format!("protocol id {pid}")));
    }
    if header[6] != unit_id {
        return Err(TransportError::Protocol(format!(
            "unit id {}, expected {unit_id}",
            header[6]
        )));
    }
    // Length includes the unit id byte.
    if len < 2 || len - 1 > MAX_PDU_LEN {
        return Err(TransportError::Protocol(format!("length field {len}")));
    }
    Ok(len - 1)
}

fn check_function(pdu: &[u8], function: u8) -> Result<(), TransportError> {
    match pdu.first() {
        Some(&fc) if fc == function => Ok(()),
        Some(&fc) if fc == function | 0x80 => Err(TransportError::Exception {
            function,
            code: pdu.get(1).copied().unwrap_or(0),
        }),
        Some(&fc) => Err(TransportError::Protocol(format!(
            "function 0x{fc:02X}, expected 0x{function:02X}"
        ))),
        None => Err(TransportError::Protocol("empty PDU".to_string())),
    }
}

/// Decode a single-bit discrete input response PDU.
pub fn decode_read_input(pdu: &[u8]) -> Result<bool, TransportError> {
    check_function(pdu, FC_READ_DISCRETE_INPUTS)?;
    match pdu {
        [_, count, data, ..] if *count >= 1 => Ok(data & 0x01 != 0),
        _ => Err(TransportError::Protocol(format!(
            "short read response ({} bytes)",
            pdu.len()
        ))),
    }
}

/// Decode a write-single-coil response PDU (an echo of the request).
pub fn decode_write_coil(pdu: &[u8], address: u16, on: bool) -> Result<(), TransportError> {
    check_function(pdu, FC_WRITE_SINGLE_COIL)?;
    let [_, a0, a1, v0, v1] = pdu else {
        return Err(TransportError::Protocol(format!(
            "write response of {} bytes",
            pdu.len()
        )));
    };
    let echoed_addr = u16::from_be_bytes([*a0, *a1]);
    let echoed_value = u16::from_be_bytes([*v0, *v1]);
    let expected = if on { COIL_ON } else { COIL_OFF };
    if echoed_addr != address || echoed_value != expected {
        return Err(TransportError::Protocol(format!(
            "write echo {echoed_addr}=0x{echoed_value:04X}, expected {address}=0x{expected:04X}"
        )));
    }
    Ok(())
}

// ─── ModbusTcpPort ──────────────────────────────────────────────────

/// Modbus/TCP client for one unit.
pub struct ModbusTcpPort {
    endpoint: String,
    unit_id: u8,
    timeout: Duration,
    stream: Option<TcpStream>,
    transaction: u16,
    /// A reconnect was already attempted since the last `begin_scan`.
    reconnect_tried: bool,
    diag: PortDiagnostics,
}

impl ModbusTcpPort {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            endpoint: format!("{}:{}", config.host, config.port),
            unit_id: config.unit_id,
            timeout: Duration::from_millis(config.timeout_ms),
            stream: None,
            transaction: 0,
            reconnect_tried: false,
            diag: PortDiagnostics::default(),
        }
    }

    /// `host:port` this port talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn resolve(&self) -> Result<SocketAddr, TransportError> {
        self.endpoint
            .to_socket_addrs()
            .map_err(|e| TransportError::NotConnected(format!("{}: {e}", self.endpoint)))?
            .next()
            .ok_or_else(|| TransportError::NotConnected(self.endpoint.clone()))
    }

    fn open(&mut self) -> Result<(), TransportError> {
        let addr = self.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| TransportError::NotConnected(format!("{}: {e}", self.endpoint)))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn next_transaction(&mut self) -> u16 {
        self.transaction = self.transaction.wrapping_add(1);
        self.transaction
    }

    /// Send one request and return the response PDU.
    fn transact(&mut self, request: &Frame) -> Result<Vec<u8>, TransportError> {
        if self.stream.is_none() {
            if self.reconnect_tried {
                self.diag.failures += 1;
                return Err(TransportError::NotConnected(format!(
                    "{}: reconnect deferred to next scan",
                    self.endpoint
                )));
            }
            self.reconnect_tried = true;
            if let Err(e) = self.open() {
                self.diag.failures += 1;
                return Err(e);
            }
            self.diag.reconnects += 1;
            debug!("Reconnected to {}", self.endpoint);
        }
        let transaction = u16::from_be_bytes([request[0], request[1]]);
        let unit_id = self.unit_id;
        let timeout_ms = self.timeout.as_millis() as u64;

        let result = match self.stream.as_mut() {
            Some(stream) => exchange(stream, request, transaction, unit_id, timeout_ms),
            None => Err(TransportError::NotConnected(self.endpoint.clone())),
        };
        if let Err(e) = &result {
            // A desynchronized stream cannot be trusted for the next frame.
            if !matches!(e, TransportError::Exception { .. }) {
                self.stream = None;
            }
            self.diag.failures += 1;
        }
        result
    }
}

fn exchange(
    stream: &mut TcpStream,
    request: &Frame,
    transaction: u16,
    unit_id: u8,
    timeout_ms: u64,
) -> Result<Vec<u8>, TransportError> {
    let map = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            TransportError::Timeout(timeout_ms)
        }
        _ => TransportError::from(e),
    };
    stream.write_all(request).map_err(map)?;
    let mut header = [0u8; MBAP_LEN];
    stream.read_exact(&mut header).map_err(map)?;
    let pdu_len = decode_header(&header, transaction, unit_id)?;
    let mut pdu = vec![0u8; pdu_len];
    stream.read_exact(&mut pdu).map_err(map)?;
    Ok(pdu)
}

impl IoPort for ModbusTcpPort {
    fn name(&self) -> &'static str {
        "modbus"
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.open()?;
        info!("Connected to Modbus/TCP {} (unit {})", self.endpoint, self.unit_id);
        Ok(())
    }

    fn begin_scan(&mut self) {
        self.reconnect_tried = false;
    }

    fn read_bit(&mut self, channel: Channel) -> Result<bool, TransportError> {
        if channel.io_type != IoPointType::Di {
            return Err(TransportError::WrongChannelType {
                address: channel.address,
                expected: "di",
                actual: "do",
            });
        }
        let tid = self.next_transaction();
        let request = encode_read_input(tid, self.unit_id, channel.address);
        let pdu = self.transact(&request)?;
        let value = decode_read_input(&pdu)?;
        self.diag.reads += 1;
        Ok(value)
    }

    fn write_bit(&mut self, channel: Channel, value: bool) -> Result<(), TransportError> {
        if channel.io_type != IoPointType::Do {
            return Err(TransportError::WrongChannelType {
                address: channel.address,
                expected: "do",
                actual: "di",
            });
        }
        let tid = self.next_transaction();
        let request = encode_write_coil(tid, self.unit_id, channel.address, value);
        let pdu = self.transact(&request)?;
        decode_write_coil(&pdu, channel.address, value)?;
        self.diag.writes += 1;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(std::net::Shutdown::Both) {
                warn!("Modbus socket shutdown: {e}");
            }
            info!("Disconnected from {}", self.endpoint);
        }
    }

    fn diagnostics(&self) -> Option<PortDiagnostics> {
        Some(self.diag)
    }
}

/// Factory for the driver registry.
pub fn create_port(config: &TransportConfig) -> Box<dyn IoPort> {
    Box::new(ModbusTcpPort::new(config))
}
