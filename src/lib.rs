//! SignalSim Library
//!
//! Simulated signal-trading system: monitors a channel message stream,
//! extracts token signals, simulates fixed take-profit/stop-loss trades and
//! serves performance statistics over an HTTP dashboard API.

pub mod config;
pub mod dashboard;
pub mod extractor;
pub mod monitor;
pub mod repository;
pub mod simulator;
pub mod stats;
pub mod types;
