//! Line state machines.
//!
//! Each session is a plain value owned by the scan loop and passed by
//! `&mut` into its step function; no subsystem keeps state of its own.

pub mod height;
pub mod queue;
pub mod supervisor;
pub mod transfer;
pub mod turntable;
