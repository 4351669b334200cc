//! Priority interrupt controller simulator library.
//!
//! This crate models interrupt dispatch on a single non-preemptive CPU:
//! 1. **SoC:** Device registry, per-device mask table, pending priority queue, and
//!    one randomized interrupt generator per device.
//! 2. **Core:** The controller that dequeues the most urgent interrupt, drops it if
//!    masked, and otherwise runs its fixed-duration service routine.
//! 3. **Simulation:** Thread orchestration, shutdown, console commands, and
//!    observer notifications.
//! 4. **Support:** Configuration, error types, and statistics.

/// Common types (errors, shutdown signal).
pub mod common;
/// Simulator configuration (defaults and JSON loading).
pub mod config;
/// Interrupt controller and dispatch state machine.
pub mod core;
/// Orchestration, commands, and notifications.
pub mod sim;
/// Devices, masks, queue, and generators.
pub mod soc;
/// Interrupt statistics collection and reporting.
pub mod stats;

/// Crate-wide error type.
pub use crate::common::{Result, SimError};
/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
