//! # Sortline Control Unit
//!
//! Box sorting line supervisor for the Factory I/O sorting scene.
//!
//! Loads `config.toml` and `io.toml` from `--config-dir` (both optional),
//! resolves every I/O role to a channel, opens the Modbus/TCP port (or the
//! in-memory simulation with `--simulate`) and runs the scan loop until
//! interrupted. All coils are switched off on the way in and out.

use clap::Parser;
use sortline_common::config::{ConfigLoader, LogLevel};
use sortline_common::consts::{CONFIG_FILE_NAME, DEFAULT_CONFIG_PATH};
use sortline_common::line::config::LineConfig;
use sortline_control_unit::config::load_config_dir;
use sortline_control_unit::cycle::CycleRunner;
use sortline_hal::DriverRegistry;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Sortline Control Unit — box sorting line supervisor
#[derive(Parser, Debug)]
#[command(name = "sortline_control_unit")]
#[command(version)]
#[command(about = "Scan-cycle supervisor for the box sorting line")]
struct Args {
    /// Config directory holding config.toml and io.toml (both optional).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Modbus/TCP host (overrides [transport].host).
    #[arg(long)]
    host: Option<String>,

    /// Modbus/TCP port (overrides [transport].port).
    #[arg(long)]
    port: Option<u16>,

    /// Use the in-memory simulated port instead of Modbus/TCP.
    #[arg(short, long)]
    simulate: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args, configured_log_level(&args));

    info!("Sortline Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Sortline Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut loaded = load_config_dir(args.config_dir.as_deref())?;

    if let Some(ref host) = args.host {
        loaded.line.transport.host = host.clone();
    }
    if let Some(port) = args.port {
        loaded.line.transport.port = port;
    }
    loaded.line.validate()?;

    info!(
        "Config OK [{}]: scan={}ms, {} roles bound ({} DI, {} DO)",
        loaded.line.shared.service_name,
        loaded.line.control.scan_interval_ms,
        loaded.registry.role_count(),
        loaded.registry.di_count,
        loaded.registry.do_count,
    );

    let driver = if args.simulate { "simulation" } else { "modbus" };
    let port = DriverRegistry::with_builtin().create_port(driver, &loaded.line.transport)?;
    info!(
        "Using '{driver}' port ({}:{}, unit {})",
        loaded.line.transport.host, loaded.line.transport.port, loaded.line.transport.unit_id
    );

    let mut runner = CycleRunner::new(loaded.line, &loaded.registry, port)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received SIGINT/SIGTERM, stopping");
        r.store(false, Ordering::SeqCst);
    })?;

    if let Err(e) = runner.run(&running) {
        error!("Scan loop error: {e}");
        runner.shutdown();
        return Err(e.into());
    }

    Ok(())
}

/// `[shared].log_level` from config.toml, read ahead of the full load so
/// the subscriber is up before anything else logs.
fn configured_log_level(args: &Args) -> LogLevel {
    let dir = args
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    LineConfig::load_optional(&dir.join(CONFIG_FILE_NAME))
        .ok()
        .flatten()
        .map(|cfg| cfg.shared.log_level)
        .unwrap_or_default()
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let directive: Directive = if args.verbose {
        Level::DEBUG.into()
    } else {
        configured
            .as_filter()
            .parse()
            .unwrap_or_else(|_| Level::INFO.into())
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
