//! Interrupt sources.
//!
//! Each registered device gets one [`InterruptSource`] running on its own thread.
//! A source sleeps for a random interval, raises one interrupt, and repeats until
//! shutdown. Sources never look at the mask table: a masked device keeps raising
//! interrupts, and the controller drops them.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{Result, ShutdownSignal, Sleep};
use crate::config::GeneratorConfig;
use crate::sim::events::{EventSink, Notification};
use crate::soc::devices::Device;
use crate::soc::queue::{InterruptEvent, InterruptQueue};
use crate::stats::SimStats;

/// Golden-ratio increment used to spread per-device seeds apart.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Raises one interrupt for `device`: counts it, notifies `sink`, and enqueues it.
///
/// Returns `false` and records nothing once the queue has been closed.
pub fn raise_interrupt(
    device: &Device,
    queue: &InterruptQueue,
    sink: &dyn EventSink,
    stats: &SimStats,
) -> bool {
    let id = device.id();
    // Counted and announced under the queue lock: observers never see a dispatch
    // before its raise, nor a raise that was not queued.
    queue.enqueue_with(InterruptEvent::new(device), || {
        stats.record_raised(id);
        sink.notify(Notification::Raised(id));
    })
}

/// Periodic interrupt generator for one device.
pub struct InterruptSource {
    device: Device,
    timing: GeneratorConfig,
    rng: StdRng,
    queue: Arc<InterruptQueue>,
    shutdown: ShutdownSignal,
    sink: Arc<dyn EventSink>,
    stats: Arc<SimStats>,
}

impl std::fmt::Debug for InterruptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptSource")
            .field("device", &self.device)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl InterruptSource {
    /// Creates a source for `device`.
    ///
    /// # Arguments
    ///
    /// * `device` - The device this source raises interrupts for.
    /// * `timing` - Sleep window between two interrupts.
    /// * `seed` - Base seed; the device id is mixed in so sources do not share a
    ///   stream. `None` seeds from OS entropy.
    /// * `queue` - Destination of raised interrupts.
    /// * `shutdown` - Cancels the inter-arrival sleep.
    /// * `sink` - Receives `Raised` notifications.
    /// * `stats` - Counters.
    pub fn new(
        device: Device,
        timing: GeneratorConfig,
        seed: Option<u64>,
        queue: Arc<InterruptQueue>,
        shutdown: ShutdownSignal,
        sink: Arc<dyn EventSink>,
        stats: Arc<SimStats>,
    ) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, |s| {
            let mix = (device.id().index() as u64 + 1).wrapping_mul(SEED_STRIDE);
            StdRng::seed_from_u64(s ^ mix)
        });
        Self {
            device,
            timing,
            rng,
            queue,
            shutdown,
            sink,
            stats,
        }
    }

    /// Device this source belongs to.
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Draws the next inter-arrival time, uniform in `[min, min + range)`.
    pub fn next_interval(&mut self) -> Duration {
        let range = self.timing.interval_range_ms;
        let jitter = if range == 0 {
            0
        } else {
            self.rng.gen_range(0..range)
        };
        self.timing.min_interval() + Duration::from_millis(jitter)
    }

    /// Raises one interrupt immediately.
    ///
    /// Returns `false` if the queue has already been closed.
    pub fn raise(&self) -> bool {
        raise_interrupt(&self.device, &self.queue, self.sink.as_ref(), &self.stats)
    }

    /// Sleep-then-raise loop; returns when shutdown is signalled.
    pub fn run(mut self) -> Result<()> {
        tracing::debug!(device = self.device().label(), "interrupt source started");
        loop {
            let interval = self.next_interval();
            if self.shutdown.sleep(interval) == Sleep::Interrupted || !self.raise() {
                break;
            }
        }
        tracing::debug!(device = self.device.label(), "interrupt source stopped");
        Ok(())
    }
}
