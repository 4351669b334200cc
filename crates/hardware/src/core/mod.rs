//! Interrupt servicing core.
//!
//! This module contains the controller that plays the role of the CPU: it pulls
//! pending interrupts off the queue one at a time, filters them through the mask
//! table, and runs each unmasked device's service routine to completion.

/// Dispatch loop and state machine.
pub mod controller;

pub use controller::{ControllerContext, ControllerState, DispatchOutcome, InterruptController};
