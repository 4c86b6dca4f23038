//! Sorting line state and configuration types.

pub mod config;
pub mod state;
