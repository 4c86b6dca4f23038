//! Integration test: configuration → runner → scan loop lifecycle.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sortline_common::io::role::IoRole;
use sortline_control_unit::config::{load_config_dir, load_config_from_strings};
use sortline_control_unit::cycle::CycleRunner;
use sortline_control_unit::error::ControlError;
use sortline_control_unit::image::{Coil, Sensor};
use sortline_hal::{DriverRegistry, SimulatedPort};

/// Tag names only, as exported from the scene; no explicit roles.
const TAG_IO_TOML: &str = r#"
[Inputs]
io = [
    { type = "di", pin = 0, name = "At Entry 1" },
    { type = "di", pin = 2, name = "At Transfer 1" },
    { type = "di", pin = 3, name = "At Transfer 2" },
    { type = "di", pin = 4, name = "At Exit" },
    { type = "di", pin = 5, name = "Start" },
    { type = "di", pin = 6, name = "Reset" },
    { type = "di", pin = 7, name = "Stop" },
    { type = "di", pin = 12, name = "Diffuse Sensor 10" },
    { type = "di", pin = 13, name = "Diffuse Sensor 11" },
    { type = "di", pin = 14, name = "Diffuse Sensor 12" },
    { type = "di", pin = 17, name = "Beam 1" },
    { type = "di", pin = 18, name = "Beam 2" },
    { type = "di", pin = 19, name = "Beam 3" },
    { type = "di", pin = 20, name = "Beam 4" },
    { type = "di", pin = 21, name = "Beam 5" },
    { type = "di", pin = 22, name = "Beam 6" },
    { type = "di", pin = 23, name = "Beam 7" },
    { type = "di", pin = 24, name = "Beam 8" },
    { type = "di", pin = 26, name = "Turntable 0 (Limit 0)" },
    { type = "di", pin = 27, name = "Turntable 0 (Limit 90)" },
    { type = "di", pin = 28, name = "Turntable 0 (Back Limit)" },
    { type = "di", pin = 29, name = "Turntable 0 (Front Limit)" },
    { type = "di", pin = 30, name = "Diffuse Sensor 0" },
]

[Coils]
io = [
    { type = "do", pin = 0, name = "Conveyor 1" },
    { type = "do", pin = 1, name = "Load 1" },
    { type = "do", pin = 4, name = "Transfer Left 1" },
    { type = "do", pin = 5, name = "Conveyor 2" },
    { type = "do", pin = 6, name = "Load 2" },
    { type = "do", pin = 9, name = "Transfer Left 2" },
    { type = "do", pin = 10, name = "Roller 4m 0" },
    { type = "do", pin = 11, name = "Roller 4m 3" },
    { type = "do", pin = 14, name = "Emitter 1" },
    { type = "do", pin = 15, name = "Emitter 2" },
    { type = "do", pin = 16, name = "Roller 6m 1" },
    { type = "do", pin = 17, name = "Stack Light 2 (Red)" },
    { type = "do", pin = 18, name = "Stack Light 2 (Green)" },
    { type = "do", pin = 19, name = "Stack Light 2 (Yellow)" },
    { type = "do", pin = 26, name = "Turntable 0 Turn" },
    { type = "do", pin = 27, name = "Turntable 0 Roll (+)" },
    { type = "do", pin = 28, name = "Turntable 0 Roll (-)" },
]
"#;

#[test]
fn tag_only_io_map_resolves_scene_addresses() {
    let loaded = load_config_from_strings("", TAG_IO_TOML).unwrap();
    let runner = CycleRunner::new(loaded.line, &loaded.registry, SimulatedPort::new()).unwrap();
    let ch = runner.channels();
    assert_eq!(ch.sensor(Sensor::EStop).address, 6);
    assert_eq!(ch.sensor(Sensor::PassThrough).address, 30);
    assert_eq!(ch.sensor(Sensor::ExitLeft).address, 13);
    assert_eq!(ch.sensor(Sensor::TableLimit90).address, 27);
    assert_eq!(ch.coil(Coil::TableRollPlus).address, 27);
    assert_eq!(ch.coil(Coil::TableRollMinus).address, 28);
    assert_eq!(ch.coil(Coil::Roller6m1).address, 16);
}

#[test]
fn missing_role_is_fatal_before_the_loop() {
    let io = TAG_IO_TOML.replace(r#"{ type = "di", pin = 29, name = "Turntable 0 (Front Limit)" },"#, "");
    let loaded = load_config_from_strings("", &io).unwrap();
    let err = CycleRunner::new(loaded.line, &loaded.registry, SimulatedPort::new())
        .err()
        .unwrap();
    match err {
        ControlError::MissingRoles(roles) => assert_eq!(roles, vec![IoRole::TableFront]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn run_loop_writes_all_off_on_exit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[control]\nscan_interval_ms = 10\nstatus_interval = 5\n",
    )
    .unwrap();
    let loaded = load_config_dir(Some(dir.path())).unwrap();
    let mut runner = CycleRunner::new(loaded.line, &loaded.registry, SimulatedPort::new()).unwrap();

    let start = runner.channels().sensor(Sensor::Start);
    runner.port_mut().set_logical(start, true);

    let running = AtomicBool::new(true);
    std::thread::scope(|s| {
        let handle = s.spawn(|| runner.run(&running));
        std::thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    });

    assert!(runner.stats().cycle_count > 0);
    assert!(runner.port().coils_on().is_empty());
    assert!(!runner.port().is_connected());
}

#[test]
fn run_with_cleared_flag_still_cycles_port() {
    let loaded = load_config_from_strings("", TAG_IO_TOML).unwrap();
    let mut runner = CycleRunner::new(loaded.line, &loaded.registry, SimulatedPort::new()).unwrap();
    runner.run(&AtomicBool::new(false)).unwrap();
    assert_eq!(runner.stats().cycle_count, 0);
    assert!(!runner.port().is_connected());
    assert!(runner.port().write_count() >= 2 * Coil::ALL.len() as u64);
}

#[test]
fn builtin_drivers_are_registered() {
    let registry = DriverRegistry::with_builtin();
    assert_eq!(registry.list_drivers(), vec!["modbus", "simulation"]);
}
