//! Console command parsing.
//!
//! The command surface is line oriented. Recognised forms:
//!
//! * `<device>` or `t <device>` - toggle the device's mask (index or label).
//! * `r <device>` - raise one interrupt for the device by hand.
//! * `s` / `status` - print masks and counters.
//! * `h` / `help` / `?` - print the command list.
//! * `q` / `quit` / `exit` - shut down.

use std::str::FromStr;

use crate::common::SimError;
use crate::stats::StatsReport;

/// Help text for the console.
pub const HELP: &str = "\
Controls:
  <n> | <label>      toggle mask of device n (1-based) or by name
  t <device>         same as above
  r <device>         raise an interrupt by hand
  s                  status
  h                  this help
  q                  quit";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flip the mask bit of the selected device.
    Toggle(String),
    /// Enqueue one interrupt for the selected device.
    Raise(String),
    /// Show current masks and counters.
    Status,
    /// Show the command list.
    Help,
    /// Shut the simulator down.
    Quit,
}

impl FromStr for Command {
    type Err = SimError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let invalid = || SimError::InvalidCommand(line.trim().to_string());
        let Some((first, rest)) = words.split_first() else {
            return Err(invalid());
        };

        match (first.to_ascii_lowercase().as_str(), rest) {
            ("q" | "quit" | "exit", []) => Ok(Self::Quit),
            ("s" | "status", []) => Ok(Self::Status),
            ("h" | "help" | "?", []) => Ok(Self::Help),
            ("t" | "toggle", [selector]) => Ok(Self::Toggle((*selector).to_string())),
            ("r" | "raise", [selector]) => Ok(Self::Raise((*selector).to_string())),
            ("t" | "toggle" | "r" | "raise", _) => Err(invalid()),
            (_, []) => Ok(Self::Toggle((*first).to_string())),
            _ => Err(invalid()),
        }
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// A mask bit was flipped.
    Toggled {
        /// Device label.
        label: String,
        /// New mask state.
        masked: bool,
    },
    /// An interrupt was raised by hand.
    Raised {
        /// Device label.
        label: String,
    },
    /// Current counters.
    Status(StatsReport),
    /// The help text should be shown.
    Help,
    /// Shutdown was initiated.
    Quit,
}
