//! Common utilities and types used throughout the interrupt simulator.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Error Handling:** The crate-wide [`SimError`] type and `Result` alias.
//! 2. **Shutdown:** The one-shot [`ShutdownSignal`] that makes every blocking wait cancellable.

/// Error types for configuration, commands, and worker failures.
pub mod error;

/// Process-wide cancellable shutdown signal.
pub mod shutdown;

pub use error::{Result, SimError};
pub use shutdown::{ShutdownSignal, Sleep};
