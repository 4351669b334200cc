//! Configuration system for the interrupt simulator.
//!
//! This module defines all configuration structures used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline device set and timing constants.
//! 2. **Structures:** General, device, and generator configuration.
//! 3. **Loading:** JSON parsing from strings and files.
//!
//! Configuration is supplied as JSON through the CLI (`--config`) or use
//! `Config::default()` for the built-in keyboard/mouse/printer setup.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::common::{Result, SimError};

/// Default configuration constants for the simulator.
///
/// These values define the baseline setup when not explicitly overridden
/// in a JSON configuration document.
mod defaults {
    /// Minimum sleep between two interrupts raised by the same source.
    pub const MIN_INTERVAL_MS: u64 = 1000;

    /// Width of the uniform random window added to the minimum sleep.
    pub const INTERVAL_RANGE_MS: u64 = 2000;

    /// ISR duration for devices that do not override it.
    pub const HANDLER_MS: u64 = 1000;

    /// ISR duration of the keyboard, the one fast device class.
    pub const KEYBOARD_HANDLER_MS: u64 = 500;
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use irqsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.devices.len(), 3);
/// assert_eq!(config.devices[0].label, "Keyboard");
/// assert_eq!(config.generator.min_interval_ms, 1000);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use irqsim_core::config::Config;
///
/// let json = r#"{
///     "general": { "seed": 7, "initial_masks": ["Disk"] },
///     "devices": [
///         { "label": "Timer", "priority": 0, "handler_ms": 5 },
///         { "label": "Disk", "priority": 4 }
///     ],
///     "generator": { "min_interval_ms": 10, "interval_range_ms": 20 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.seed, Some(7));
/// assert_eq!(config.devices[1].handler_ms, 1000);
/// assert_eq!(config.generator.interval_range_ms, 20);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Interrupt sources, in registry order
    #[serde(default = "Config::default_devices")]
    pub devices: Vec<DeviceConfig>,
    /// Interrupt generation timing
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Keyboard, mouse and printer, in descending priority.
    fn default_devices() -> Vec<DeviceConfig> {
        vec![
            DeviceConfig {
                label: "Keyboard".to_string(),
                priority: 1,
                handler_ms: defaults::KEYBOARD_HANDLER_MS,
            },
            DeviceConfig {
                label: "Mouse".to_string(),
                priority: 2,
                handler_ms: defaults::HANDLER_MS,
            },
            DeviceConfig {
                label: "Printer".to_string(),
                priority: 3,
                handler_ms: defaults::HANDLER_MS,
            },
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            devices: Self::default_devices(),
            generator: GeneratorConfig::default(),
        }
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Seed for the generators' random intervals; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Device labels that start out masked
    #[serde(default)]
    pub initial_masks: Vec<String>,
}

/// A single interrupt source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Display name, also accepted as a console selector; must not be all digits
    pub label: String,

    /// Priority rank; lower ranks are served first and must be unique
    pub priority: u32,

    /// Duration of this device's interrupt service routine
    #[serde(default = "DeviceConfig::default_handler_ms")]
    pub handler_ms: u64,
}

impl DeviceConfig {
    /// Returns the default ISR duration.
    fn default_handler_ms() -> u64 {
        defaults::HANDLER_MS
    }
}

/// Interrupt generation timing shared by every source.
///
/// Each source sleeps for `min_interval_ms + U[0, interval_range_ms)` between
/// two interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Minimum sleep between interrupts
    #[serde(default = "GeneratorConfig::default_min_interval")]
    pub min_interval_ms: u64,

    /// Random window added on top of the minimum
    #[serde(default = "GeneratorConfig::default_interval_range")]
    pub interval_range_ms: u64,
}

impl GeneratorConfig {
    /// Returns the default minimum generator interval.
    fn default_min_interval() -> u64 {
        defaults::MIN_INTERVAL_MS
    }

    /// Returns the default random window.
    fn default_interval_range() -> u64 {
        defaults::INTERVAL_RANGE_MS
    }

    /// Rejects a configuration where sources would fire back-to-back with no sleep.
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_ms == 0 && self.interval_range_ms == 0 {
            return Err(SimError::InvalidInterval {
                min_ms: self.min_interval_ms,
                range_ms: self.interval_range_ms,
            });
        }
        Ok(())
    }

    /// Minimum interval as a [`Duration`].
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Random window as a [`Duration`].
    pub const fn interval_range(&self) -> Duration {
        Duration::from_millis(self.interval_range_ms)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: defaults::MIN_INTERVAL_MS,
            interval_range_ms: defaults::INTERVAL_RANGE_MS,
        }
    }
}
