//! Simulation orchestration and the command surface.
//!
//! Provides the [`Simulator`] that wires the interrupt fabric to its worker
//! threads, the console command language, and the notification sinks observers
//! attach to.

/// Console command parsing and outcomes.
pub mod command;

/// Notifications and sinks.
pub mod events;

/// Top-level simulator and thread management.
pub mod simulator;

pub use command::{Command, CommandOutcome};
pub use events::{ChannelSink, EventSink, FanoutSink, Notification, NullSink, TracingSink};
pub use simulator::Simulator;
