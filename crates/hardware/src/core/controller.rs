//! Interrupt controller (dispatcher).
//!
//! The controller is the single consumer of the [`InterruptQueue`]. Each turn of
//! its loop walks the dispatch state machine:
//!
//! ```text
//!   Waiting --dequeue--> Evaluating --masked--> Waiting
//!                            |
//!                            +--unmasked--> Handling --ISR done--> Waiting
//!
//!   any state --shutdown--> Stopped
//! ```
//!
//! Handling is non-preemptive: the next event is not dequeued until the current
//! ISR has finished, so at most one interrupt is ever in service as long as a
//! single thread drives the controller. The mask bit is read once, when the event
//! is evaluated; later toggles do not affect an event already in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use crate::common::{Result, ShutdownSignal, SimError, Sleep};
use crate::sim::events::{EventSink, Notification};
use crate::soc::devices::DeviceRegistry;
use crate::soc::mask::MaskTable;
use crate::soc::queue::{Dequeued, InterruptEvent, InterruptQueue};
use crate::stats::SimStats;

/// Dispatch state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerState {
    /// Blocked on the queue with no event in hand.
    Waiting = 0,
    /// An event was dequeued and its mask bit is being checked.
    Evaluating = 1,
    /// Running an ISR.
    Handling = 2,
    /// Shut down; terminal.
    Stopped = 3,
}

impl ControllerState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Waiting,
            1 => Self::Evaluating,
            2 => Self::Handling,
            _ => Self::Stopped,
        }
    }
}

/// What the controller did with one dequeued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The device was masked; no ISR ran.
    Dropped,
    /// The ISR ran for its full duration.
    Completed,
    /// Shutdown interrupted the ISR.
    Aborted,
}

/// Shared handles the controller works with.
#[derive(Clone)]
pub struct ControllerContext {
    /// Device set, for ISR durations.
    pub registry: Arc<DeviceRegistry>,
    /// Mask bits consulted at evaluation time.
    pub masks: Arc<MaskTable>,
    /// Source of pending events.
    pub queue: Arc<InterruptQueue>,
    /// Cancels ISR sleeps.
    pub shutdown: ShutdownSignal,
    /// Receives dropped/dispatched/completed notifications.
    pub sink: Arc<dyn EventSink>,
    /// Counters.
    pub stats: Arc<SimStats>,
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("devices", &self.registry.len())
            .field("pending", &self.queue.len())
            .field("shutdown", &self.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}

/// Single-threaded interrupt dispatcher.
#[derive(Debug)]
pub struct InterruptController {
    ctx: ControllerContext,
    state: AtomicU8,
}

impl InterruptController {
    /// Creates a controller in the [`ControllerState::Waiting`] state.
    pub const fn new(ctx: ControllerContext) -> Self {
        Self {
            ctx,
            state: AtomicU8::new(ControllerState::Waiting as u8),
        }
    }

    /// Current dispatch state.
    pub fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ControllerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Runs the dispatch loop until shutdown.
    ///
    /// Returns `Ok(())` on an orderly shutdown. An event naming a device outside
    /// the registry is a programming error: the loop stops and reports it.
    ///
    /// # Single caller
    ///
    /// Exactly one thread may drive a controller, through either `run` or
    /// [`dispatch`](Self::dispatch). Two concurrent callers would put two ISRs in
    /// service at once. [`Simulator`](crate::sim::Simulator) enforces this by
    /// starting the controller thread at most once.
    pub fn run(&self) -> Result<()> {
        tracing::debug!("interrupt controller started");
        let result = self.run_loop();
        self.set_state(ControllerState::Stopped);
        match &result {
            Ok(()) => tracing::info!("interrupt controller shutting down"),
            Err(e) => tracing::error!(error = %e, "interrupt controller failed"),
        }
        result
    }

    fn run_loop(&self) -> Result<()> {
        loop {
            self.set_state(ControllerState::Waiting);
            let event = match self.ctx.queue.dequeue_blocking() {
                Dequeued::Event(event) => event,
                Dequeued::Closed => return Ok(()),
            };
            if self.dispatch(event)? == DispatchOutcome::Aborted {
                return Ok(());
            }
        }
    }

    /// Evaluates and, if unmasked, services one event.
    ///
    /// Blocks for the device's ISR duration on the unmasked path. Leaves the
    /// controller in [`ControllerState::Waiting`] unless the ISR was aborted.
    ///
    /// Must not be called while [`run`](Self::run) or another `dispatch` is in
    /// progress on the same controller; see the single-caller note on `run`.
    pub fn dispatch(&self, event: InterruptEvent) -> Result<DispatchOutcome> {
        self.set_state(ControllerState::Evaluating);
        let id = event.device();
        let device = self
            .ctx
            .registry
            .get(id)
            .ok_or_else(|| SimError::UnknownDevice(id.to_string()))?;
        let latency = event.age();

        if self.ctx.masks.is_masked(id) {
            self.ctx.stats.record_dropped(id, latency);
            self.ctx.sink.notify(Notification::Dropped(id));
            self.set_state(ControllerState::Waiting);
            return Ok(DispatchOutcome::Dropped);
        }

        self.set_state(ControllerState::Handling);
        let before = self.ctx.stats.enter_service(id, latency);
        debug_assert_eq!(before, 0, "nested interrupt service");
        self.ctx.sink.notify(Notification::Dispatched(id));
        tracing::debug!(
            device = device.label(),
            isr_ms = device.handler_duration().as_millis() as u64,
            "handling isr"
        );

        let started = Instant::now();
        let sleep = self.ctx.shutdown.sleep(device.handler_duration());
        let completed = sleep == Sleep::Elapsed;
        self.ctx.stats.exit_service(id, started.elapsed(), completed);

        if completed {
            self.ctx.sink.notify(Notification::Completed(id));
            self.set_state(ControllerState::Waiting);
            Ok(DispatchOutcome::Completed)
        } else {
            tracing::debug!(device = device.label(), "isr aborted by shutdown");
            self.set_state(ControllerState::Stopped);
            Ok(DispatchOutcome::Aborted)
        }
    }
}
