//! # Sortline Control Unit Library
//!
//! Scan-cycle controller for the box sorting line: a supervisory
//! run/stop/e-stop state machine gating a light-curtain height pipeline,
//! a line 2 → line 1 transfer interlock and a turntable sequencer that
//! ejects each box left or right by size.
//!
//! ## Scan Levels
//!
//! 1. **SupervisoryState** — Stopped / Running / EmergencyStopped
//! 2. **TransferPhase** — line transfer interlock
//! 3. **TurntablePhase** — load, rotate, eject, return
//!
//! All line state is owned by [`cycle::CycleRunner`] and passed by `&mut`
//! into each subsystem step; the box queue is the only structure shared
//! between subsystems.

pub mod arbiter;
pub mod channels;
pub mod config;
pub mod cycle;
pub mod error;
pub mod image;
pub mod state;
