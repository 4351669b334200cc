//! Simulator error definitions.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Configuration Errors:** Registry and timing problems detected at startup.
//! 2. **Command Errors:** Bad device selectors or commands from the console surface.
//! 3. **Worker Errors:** Failures of generator or controller threads, reported on join.
//!
//! Cancellation is deliberately absent: a shutdown that wakes a blocked wait is the
//! normal exit path and is reported through [`Dequeued`](crate::soc::queue::Dequeued)
//! and [`Sleep`](crate::common::shutdown::Sleep), never as an error.

use thiserror::Error;

/// Errors produced by the interrupt simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// The device registry was configured with no devices.
    #[error("device registry is empty; at least one interrupt source is required")]
    EmptyRegistry,

    /// Two devices share the same priority rank.
    #[error("devices `{first}` and `{second}` share priority rank {priority}")]
    DuplicatePriority {
        /// The contested priority rank.
        priority: u32,
        /// Label of the first device with this rank.
        first: String,
        /// Label of the second device with this rank.
        second: String,
    },

    /// Two devices share the same label (labels double as console selectors).
    #[error("device label `{0}` is used more than once")]
    DuplicateLabel(String),

    /// A device was configured with an empty label.
    #[error("device at index {0} has an empty label")]
    EmptyLabel(usize),

    /// A device label is all digits and would be read as a 1-based index.
    #[error("device label `{0}` is numeric; labels must not look like device indices")]
    NumericLabel(String),

    /// The generator interval has a zero minimum and zero range.
    #[error("generator interval must be non-zero (min {min_ms} ms, range {range_ms} ms)")]
    InvalidInterval {
        /// Configured minimum sleep in milliseconds.
        min_ms: u64,
        /// Configured random range in milliseconds.
        range_ms: u64,
    },

    /// A command named a device that is not in the registry.
    #[error("unknown device `{0}`")]
    UnknownDevice(String),

    /// A console command could not be parsed.
    #[error("invalid command `{0}`")]
    InvalidCommand(String),

    /// Reading a configuration file failed.
    #[error("failed to read config `{path}`: {source}")]
    ConfigIo {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration document was not valid JSON for [`Config`](crate::config::Config).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A worker thread could not be started.
    #[error("failed to spawn worker `{name}`: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked; its loop terminated.
    #[error("worker `{0}` panicked")]
    WorkerPanicked(String),

    /// A manual raise arrived after shutdown closed the queue.
    #[error("simulator is shutting down")]
    ShuttingDown,

    /// The simulator was started twice.
    #[error("simulator is already running")]
    AlreadyStarted,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
