//! Scan cycle: read → decide → write.
//!
//! ## Scan Body
//! 1. Read every sensor and beam. A failed read is logical `false`.
//! 2. Supervisor edge detection. Stop/EStop take effect before any
//!    subsystem runs, so a shutdown is never overridden in the same scan.
//! 3. While running: height pipeline, transfer interlock, turntable
//!    sequencer. The transfer never arms while the table is loading and
//!    the table never starts a load while a transfer is in progress. A
//!    critical fault (stall) forces EmergencyStopped.
//! 4. Compose the output image (feed arbiter, turntable and transfer
//!    coils, stack light).
//! 5. Write only the coils whose level changed. A failed write is not
//!    committed and is retried on the next scan.
//!
//! ## Startup / Shutdown
//! Both force-write the all-off image, so the line never starts or ends
//! with an actuator energized.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use sortline_common::io::registry::IoRegistry;
use sortline_common::line::config::LineConfig;
use sortline_common::line::state::{Direction, SupervisoryState, TransferPhase, TurntablePhase};
use sortline_hal::port::IoPort;
use tracing::{debug, error, info, warn};

use crate::arbiter::FeedArbiter;
use crate::channels::ChannelMap;
use crate::error::{ControlError, CycleError, LineError, StallFault};
use crate::image::{COIL_COUNT, Coil, InputImage, OutputImage, Sensor};
use crate::state::height::{self, HeightAccumulator};
use crate::state::queue::BoxQueue;
use crate::state::supervisor::{Supervisor, SupervisorEvent};
use crate::state::transfer::{TransferInterlock, TransferOutputs, TransferSession};
use crate::state::turntable::{TurntableOutputs, TurntableSequencer, TurntableSession};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-scan timing and fault counters.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    /// Total scans executed.
    pub cycle_count: u64,
    /// Last scan duration [µs].
    pub last_cycle_us: u64,
    /// Minimum scan duration [µs].
    pub min_cycle_us: u64,
    /// Maximum scan duration [µs].
    pub max_cycle_us: u64,
    /// Running sum for average computation.
    pub sum_cycle_us: u64,
    /// Scans that took longer than the scan interval.
    pub overruns: u64,
    /// Failed input reads.
    pub read_faults: u64,
    /// Failed coil writes.
    pub write_faults: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_us: 0,
            min_cycle_us: u64::MAX,
            max_cycle_us: 0,
            sum_cycle_us: 0,
            overruns: 0,
            read_faults: 0,
            write_faults: 0,
        }
    }

    /// Record a scan duration.
    #[inline]
    pub fn record(&mut self, duration_us: u64) {
        self.cycle_count += 1;
        self.last_cycle_us = duration_us;
        self.min_cycle_us = self.min_cycle_us.min(duration_us);
        self.max_cycle_us = self.max_cycle_us.max(duration_us);
        self.sum_cycle_us = self.sum_cycle_us.saturating_add(duration_us);
    }

    /// Average scan time [µs] (0 if no scans).
    #[inline]
    pub fn avg_cycle_us(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_us / self.cycle_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Status Snapshot ────────────────────────────────────────────────

/// Periodic status line, logged as JSON.
#[derive(Debug, Serialize)]
struct StatusSnapshot<'a> {
    cycle: u64,
    state: SupervisoryState,
    turntable: TurntablePhase,
    transfer: TransferPhase,
    current_box: Option<u8>,
    direction: Option<Direction>,
    queue: Vec<u8>,
    coils_on: Vec<String>,
    faults: u8,
    stats: &'a CycleStats,
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the port, the resolved channels and every piece of line state.
pub struct CycleRunner<P: IoPort> {
    config: LineConfig,
    channels: ChannelMap,
    port: P,

    supervisor: Supervisor,
    height: HeightAccumulator,
    queue: BoxQueue,
    turntable: TurntableSession,
    transfer: TransferSession,
    sequencer: TurntableSequencer,
    interlock: TransferInterlock,

    inputs: InputImage,
    outputs: OutputImage,
    /// Level last acknowledged by the port, per coil. `None` forces a write.
    last_written: [Option<bool>; COIL_COUNT],
    last_faults: LineError,
    stats: CycleStats,
}

impl<P: IoPort> CycleRunner<P> {
    /// Resolve channels and build the runner. Fails on a ConfigurationFault.
    pub fn new(config: LineConfig, registry: &IoRegistry, port: P) -> Result<Self, ControlError> {
        config.validate()?;
        let channels = ChannelMap::from_registry(registry)?;

        let stall = config.control.stall_cycles();
        let sequencer = TurntableSequencer::new(config.routing.clone(), stall);
        let interlock = TransferInterlock::new(
            config.control.ejection_delay_cycles(),
            config.control.resume_delay_cycles(),
            stall,
        );

        Ok(Self {
            config,
            channels,
            port,
            supervisor: Supervisor::new(),
            height: HeightAccumulator::new(),
            queue: BoxQueue::new(),
            turntable: TurntableSession::new(),
            transfer: TransferSession::new(),
            sequencer,
            interlock,
            inputs: InputImage::default(),
            outputs: OutputImage::all_off(),
            last_written: [None; COIL_COUNT],
            last_faults: LineError::empty(),
            stats: CycleStats::new(),
        })
    }

    // ── Accessors ──

    pub fn state(&self) -> SupervisoryState {
        self.supervisor.state()
    }

    pub fn turntable(&self) -> &TurntableSession {
        &self.turntable
    }

    pub fn transfer(&self) -> &TransferSession {
        &self.transfer
    }

    pub fn queue(&self) -> &BoxQueue {
        &self.queue
    }

    pub fn height(&self) -> &HeightAccumulator {
        &self.height
    }

    pub fn inputs(&self) -> &InputImage {
        &self.inputs
    }

    /// Output image commanded by the last scan.
    pub fn outputs(&self) -> &OutputImage {
        &self.outputs
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Faults raised by the last scan.
    pub fn last_faults(&self) -> LineError {
        self.last_faults
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    // ── Lifecycle ──

    /// Connect the port and force every coil off.
    pub fn start(&mut self) -> Result<(), CycleError> {
        self.port.connect()?;
        info!("Port '{}' connected", self.port.name());
        self.force_all_off();
        Ok(())
    }

    /// Force every coil off and release the port.
    pub fn shutdown(&mut self) {
        self.force_all_off();
        if let Some(d) = self.port.diagnostics() {
            info!(
                "Port diagnostics: {} reads, {} writes, {} failures, {} reconnects",
                d.reads, d.writes, d.failures, d.reconnects
            );
        }
        self.port.close();
        info!(
            "Port '{}' closed after {} scans",
            self.port.name(),
            self.stats.cycle_count
        );
    }

    fn force_all_off(&mut self) {
        self.port.begin_scan();
        self.reset_sessions();
        self.outputs = OutputImage::all_off();
        self.last_written = [None; COIL_COUNT];
        let faults = self.write_outputs();
        if faults.contains(LineError::WRITE_FAULT) {
            warn!("All-off write incomplete; some coils may still be energized");
        }
    }

    /// Run scans at the configured interval until `running` is cleared.
    ///
    /// All-off is written on the way out, whatever ended the loop.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), CycleError> {
        self.start()?;

        let interval = Duration::from_millis(self.config.control.scan_interval_ms);
        let interval_us = interval.as_micros() as u64;
        let status_interval = u64::from(self.config.control.status_interval);
        info!(
            "Scan loop started: interval {} ms, stall timeout {:?} scans",
            self.config.control.scan_interval_ms,
            self.config.control.stall_cycles()
        );

        while running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();

            self.scan_once();

            let elapsed = cycle_start.elapsed();
            let duration_us = elapsed.as_micros() as u64;
            self.stats.record(duration_us);
            if duration_us > interval_us {
                self.stats.overruns += 1;
                warn!("Scan overrun: {duration_us} µs > {interval_us} µs");
            }

            if status_interval != 0 && self.stats.cycle_count % status_interval == 0 {
                self.log_status();
            }

            if let Some(remaining) = interval.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        info!("Scan loop stopping");
        self.shutdown();
        Ok(())
    }

    /// Execute one scan and return the faults it raised.
    pub fn scan_once(&mut self) -> LineError {
        let mut faults = LineError::empty();
        self.port.begin_scan();

        // ═══ READ ═══
        faults |= self.read_inputs();

        // ═══ SUPERVISOR ═══
        let step = self.supervisor.step(
            self.inputs.get(Sensor::Start),
            self.inputs.get(Sensor::Stop),
            self.inputs.get(Sensor::EStop),
        );
        if step.left_running() {
            info!(
                "Line halted ({}); {} queued boxes discarded",
                step.after,
                self.queue.len()
            );
        }

        // ═══ SUBSYSTEMS ═══
        let mut commands = None;
        if self.supervisor.state().is_running() {
            match self.advance_sequences() {
                Ok(c) => commands = Some(c),
                Err(fault) => {
                    error!("{fault}");
                    faults |= fault.sequence.flag();
                }
            }
        }
        if faults.has_critical() {
            self.supervisor.handle_event(SupervisorEvent::Stall);
        }
        if !self.supervisor.state().is_running() {
            self.reset_sessions();
        }

        // ═══ WRITE ═══
        self.compose_outputs(commands);
        faults |= self.write_outputs();

        self.last_faults = faults;
        faults
    }

    fn advance_sequences(&mut self) -> Result<(TurntableOutputs, TransferOutputs), StallFault> {
        height::advance(
            &mut self.height,
            self.inputs.get(Sensor::PassThrough),
            self.inputs.blocked_beams(),
            &mut self.queue,
        );
        let transfer = self
            .interlock
            .step(&mut self.transfer, &self.inputs, self.turntable.phase)?;
        let table = self.sequencer.step(
            &mut self.turntable,
            &self.inputs,
            &mut self.queue,
            self.transfer.phase,
        )?;
        Ok((table, transfer))
    }

    fn reset_sessions(&mut self) {
        self.height.reset();
        self.queue.clear();
        self.turntable.reset();
        self.transfer.reset();
    }

    fn read_inputs(&mut self) -> LineError {
        let mut faults = LineError::empty();
        for sensor in Sensor::ALL {
            let channel = self.channels.sensor(sensor);
            let value = match self.port.read_bit(channel) {
                Ok(raw) => channel.logical(raw),
                Err(e) => {
                    debug!("Read {sensor:?} @{} failed: {e}", channel.address);
                    faults |= LineError::READ_FAULT;
                    self.stats.read_faults += 1;
                    false
                }
            };
            self.inputs.set(sensor, value);
        }

        self.inputs.beams.clear();
        for (i, channel) in self.channels.beams().iter().enumerate() {
            let value = match self.port.read_bit(*channel) {
                Ok(raw) => channel.logical(raw),
                Err(e) => {
                    debug!("Read beam {} @{} failed: {e}", i + 1, channel.address);
                    faults |= LineError::READ_FAULT;
                    self.stats.read_faults += 1;
                    false
                }
            };
            // Beam count never exceeds capacity.
            let _ = self.inputs.beams.push(value);
        }
        faults
    }

    /// `commands` is `None` whenever the line is not running.
    fn compose_outputs(&mut self, commands: Option<(TurntableOutputs, TransferOutputs)>) {
        let mut out = OutputImage::all_off();
        let (table, transfer) = commands.unzip();

        FeedArbiter {
            running: self.supervisor.state().is_running(),
            turntable_hold: table.is_some_and(|t| t.feed_hold),
            transfer_hold: transfer.is_some_and(|t| t.feed_hold),
        }
        .apply(&mut out);

        if let (Some(table), Some(transfer)) = (table, transfer) {
            out.set(Coil::TableTurn, table.turn);
            out.set(Coil::TableRollPlus, table.roll_plus);
            out.set(Coil::TableRollMinus, table.roll_minus);
            out.set(Coil::TransferLeft1, transfer.transfer_left);
            out.set(Coil::TransferLeft2, transfer.transfer_left);
        }

        out.set_stack_light(self.supervisor.state(), self.turntable.phase);
        self.outputs = out;
    }

    fn write_outputs(&mut self) -> LineError {
        let mut faults = LineError::empty();
        for coil in Coil::ALL {
            let value = self.outputs.get(coil);
            if self.last_written[coil as usize] == Some(value) {
                continue;
            }
            let channel = self.channels.coil(coil);
            match self.port.write_bit(channel, channel.physical(value)) {
                Ok(()) => self.last_written[coil as usize] = Some(value),
                Err(e) => {
                    debug!("Write {coil:?} @{} failed: {e}", channel.address);
                    faults |= LineError::WRITE_FAULT;
                    self.stats.write_faults += 1;
                }
            }
        }
        faults
    }

    fn log_status(&self) {
        let snapshot = StatusSnapshot {
            cycle: self.stats.cycle_count,
            state: self.supervisor.state(),
            turntable: self.turntable.phase,
            transfer: self.transfer.phase,
            current_box: self.turntable.current_box.map(|s| s.get()),
            direction: self.turntable.eject_direction,
            queue: self.queue.sizes(),
            coils_on: self
                .outputs
                .energized()
                .map(|c| format!("{c:?}"))
                .collect(),
            faults: self.last_faults.bits(),
            stats: &self.stats,
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => debug!("Status: {json}"),
            Err(e) => debug!("Status snapshot not serializable: {e}"),
        }
    }
}
