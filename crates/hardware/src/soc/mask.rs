//! Per-device interrupt mask table.
//!
//! One [`AtomicBool`] per device, indexed by [`DeviceId`]. Devices never contend
//! with each other: there is no table-wide lock. The controller reads a device's
//! bit once per dequeued event; the command surface flips it.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::soc::devices::{DeviceId, DeviceRegistry};

/// Concurrent masked/unmasked state for every registered device.
#[derive(Debug)]
pub struct MaskTable {
    bits: Vec<AtomicBool>,
}

impl MaskTable {
    /// Creates a table with every device of `registry` unmasked.
    pub fn new(registry: &DeviceRegistry) -> Self {
        Self::with_len(registry.len())
    }

    /// Creates a table of `len` unmasked entries.
    pub fn with_len(len: usize) -> Self {
        Self {
            bits: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Snapshot read of a device's mask bit.
    ///
    /// Unknown ids read as unmasked.
    #[inline]
    pub fn is_masked(&self, id: DeviceId) -> bool {
        self.bits
            .get(id.index())
            .is_some_and(|bit| bit.load(Ordering::Acquire))
    }

    /// Atomically flips a device's mask bit and returns the new state.
    ///
    /// A single `fetch_xor` keeps concurrent toggles linearizable: two toggles
    /// always cancel out, whatever their interleaving.
    pub fn toggle(&self, id: DeviceId) -> Option<bool> {
        self.bits
            .get(id.index())
            .map(|bit| !bit.fetch_xor(true, Ordering::AcqRel))
    }

    /// Forces a device's mask bit, returning the previous state.
    pub fn set(&self, id: DeviceId, masked: bool) -> Option<bool> {
        self.bits
            .get(id.index())
            .map(|bit| bit.swap(masked, Ordering::AcqRel))
    }

    /// Copies every mask bit, in registry order.
    pub fn snapshot(&self) -> Vec<bool> {
        self.bits.iter().map(|b| b.load(Ordering::Acquire)).collect()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}
