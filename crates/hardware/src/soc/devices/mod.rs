//! Interrupt source devices.
//!
//! This module defines the immutable description of each interrupt source and
//! the registry that owns the fixed device set:
//! 1. **Identity:** [`DeviceId`] is the device's index in the registry.
//! 2. **Description:** [`Device`] carries priority rank, label, and ISR duration.
//! 3. **Registry:** [`DeviceRegistry`] validates and owns the ordered device set.

use std::fmt;
use std::time::Duration;

/// Validated, immutable device set.
pub mod registry;

pub use registry::DeviceRegistry;

/// Index of a device in its [`DeviceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub usize);

impl DeviceId {
    /// Returns the raw registry index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An interrupt source with a fixed priority rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    priority: u32,
    label: String,
    handler: Duration,
}

impl Device {
    /// Creates a device description.
    ///
    /// # Arguments
    ///
    /// * `id` - Index of the device in its registry.
    /// * `priority` - Rank; lower values are served first.
    /// * `label` - Display name.
    /// * `handler` - How long the controller spends in this device's ISR.
    pub fn new(id: DeviceId, priority: u32, label: impl Into<String>, handler: Duration) -> Self {
        Self {
            id,
            priority,
            label: label.into(),
            handler,
        }
    }

    /// Registry index of this device.
    #[inline]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Priority rank (lower is more urgent).
    #[inline]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Display name.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// ISR duration.
    #[inline]
    pub const fn handler_duration(&self) -> Duration {
        self.handler
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (prio {})", self.label, self.priority)
    }
}
