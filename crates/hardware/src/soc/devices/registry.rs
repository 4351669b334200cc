//! Device registry.
//!
//! The registry is built once at startup from [`DeviceConfig`] records and never
//! changes afterwards. Construction enforces the invariants every other component
//! relies on: the set is non-empty, priority ranks are unique, and labels are
//! unique, non-empty, and not purely numeric so they can be used as console
//! selectors next to 1-based indices.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::{Device, DeviceId};
use crate::common::{Result, SimError};
use crate::config::DeviceConfig;

/// Case folding shared by duplicate detection and selector lookup.
fn fold(label: &str) -> String {
    label.to_lowercase()
}

/// Whether `text` has the shape of a 1-based device index.
fn is_index(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Ordered, immutable set of interrupt sources.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    /// Builds and validates a registry from configuration records.
    ///
    /// Devices keep the order of `configs`; each device's [`DeviceId`] is its index.
    pub fn from_config(configs: &[DeviceConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(SimError::EmptyRegistry);
        }

        let mut by_priority: HashMap<u32, &str> = HashMap::with_capacity(configs.len());
        let mut labels: HashSet<String> = HashSet::with_capacity(configs.len());
        let mut devices = Vec::with_capacity(configs.len());

        for (idx, cfg) in configs.iter().enumerate() {
            let label = cfg.label.trim();
            if label.is_empty() {
                return Err(SimError::EmptyLabel(idx));
            }
            if is_index(label) {
                return Err(SimError::NumericLabel(label.to_string()));
            }
            if let Some(first) = by_priority.insert(cfg.priority, label) {
                return Err(SimError::DuplicatePriority {
                    priority: cfg.priority,
                    first: first.to_string(),
                    second: label.to_string(),
                });
            }
            if !labels.insert(fold(label)) {
                return Err(SimError::DuplicateLabel(label.to_string()));
            }
            devices.push(Device::new(
                DeviceId(idx),
                cfg.priority,
                label,
                Duration::from_millis(cfg.handler_ms),
            ));
        }

        Ok(Self { devices })
    }

    /// Number of devices (never zero).
    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Always `false`; present for API symmetry with collections.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterates devices in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    /// Looks up a device by id.
    ///
    /// Ids handed out by this registry are always valid, so `None` only results
    /// from an id minted elsewhere.
    #[inline]
    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.index())
    }

    /// Resolves a console selector to a device.
    ///
    /// Accepts a 1-based index (`"1"` is the first device) or a label, compared
    /// case-insensitively. Labels are never all digits, so the two forms cannot
    /// collide.
    pub fn find(&self, selector: &str) -> Result<&Device> {
        let selector = selector.trim();
        if is_index(selector) {
            return selector
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| self.devices.get(idx))
                .ok_or_else(|| SimError::UnknownDevice(selector.to_string()));
        }
        let wanted = fold(selector);
        self.devices
            .iter()
            .find(|d| fold(d.label()) == wanted)
            .ok_or_else(|| SimError::UnknownDevice(selector.to_string()))
    }
}

impl<'a> IntoIterator for &'a DeviceRegistry {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
