//! Interrupt fabric components.
//!
//! This module organizes the pieces that sit between the interrupt sources and
//! the controller: the device registry, the mask table, the pending queue, and
//! the per-device generators.

/// Interrupt source descriptions and the device registry.
pub mod devices;

/// Per-device interrupt generators.
pub mod generator;

/// Per-device mask bits.
pub mod mask;

/// Pending interrupt priority queue.
pub mod queue;

pub use devices::{Device, DeviceId, DeviceRegistry};
pub use generator::InterruptSource;
pub use mask::MaskTable;
pub use queue::{Dequeued, InterruptEvent, InterruptQueue};
