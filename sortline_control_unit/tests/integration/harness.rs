//! Scan-by-scan test bench over the simulated port.

use sortline_common::io::config::IoConfig;
use sortline_common::io::registry::IoRegistry;
use sortline_common::line::config::LineConfig;
use sortline_common::line::state::{SupervisoryState, TurntablePhase};
use sortline_control_unit::cycle::CycleRunner;
use sortline_control_unit::error::LineError;
use sortline_control_unit::image::{Coil, Sensor};
use sortline_hal::SimulatedPort;

pub struct Line {
    pub runner: CycleRunner<SimulatedPort>,
}

impl Line {
    pub fn new() -> Self {
        Self::with_config(LineConfig::default())
    }

    pub fn with_config(config: LineConfig) -> Self {
        let registry = IoRegistry::from_config(&IoConfig::scene_default().unwrap()).unwrap();
        let mut runner = CycleRunner::new(config, &registry, SimulatedPort::new()).unwrap();
        runner.start().unwrap();
        Self { runner }
    }

    /// Stopped → Running with one press of Start.
    pub fn running() -> Self {
        let mut line = Self::new();
        line.press(Sensor::Start);
        assert_eq!(line.state(), SupervisoryState::Running);
        line
    }

    pub fn set(&mut self, sensor: Sensor, value: bool) {
        let channel = self.runner.channels().sensor(sensor);
        self.runner.port_mut().set_logical(channel, value);
    }

    /// Interrupt the lowest `n` beams.
    pub fn set_blocked(&mut self, n: usize) {
        let beams = self.runner.channels().beams().to_vec();
        for (i, channel) in beams.into_iter().enumerate() {
            self.runner.port_mut().set_logical(channel, i < n);
        }
    }

    pub fn scan(&mut self) -> LineError {
        self.runner.scan_once()
    }

    /// Hold a button for one scan, then release it for one scan.
    pub fn press(&mut self, button: Sensor) -> LineError {
        self.set(button, true);
        let faults = self.scan();
        self.set(button, false);
        faults | self.scan()
    }

    /// Logical coil level as seen by the device.
    pub fn coil(&self, coil: Coil) -> bool {
        let channel = self.runner.channels().coil(coil);
        self.runner.port().coil_logical(channel)
    }

    /// Every coil the device has on.
    pub fn energized(&self) -> Vec<Coil> {
        Coil::ALL.into_iter().filter(|c| self.coil(*c)).collect()
    }

    pub fn state(&self) -> SupervisoryState {
        self.runner.state()
    }

    pub fn phase(&self) -> TurntablePhase {
        self.runner.turntable().phase
    }

    /// Pass one box through the light curtain with the given beam counts.
    pub fn measure(&mut self, heights: &[usize]) {
        self.set(Sensor::PassThrough, true);
        for &h in heights {
            self.set_blocked(h);
            self.scan();
        }
        self.set(Sensor::PassThrough, false);
        self.set_blocked(0);
        self.scan();
    }

    /// Drive a box from Idle onto the table until it is Positioned.
    pub fn load_box(&mut self) {
        self.set(Sensor::LoadPresence, true);
        self.scan();
        assert_eq!(self.phase(), TurntablePhase::Loading);
        self.set(Sensor::LoadPresence, false);
        self.set(Sensor::TableBack, true);
        self.scan();
        self.set(Sensor::TableFront, true);
        self.scan();
        assert_eq!(self.phase(), TurntablePhase::Positioned);
    }
}
