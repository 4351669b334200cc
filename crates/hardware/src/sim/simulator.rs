//! Simulator: owns the shared interrupt fabric and the worker threads.
//!
//! The simulator builds the registry, mask table, queue, and statistics from a
//! [`Config`], then runs one controller thread and one generator thread per
//! device. It is also the command surface: mask toggles, manual raises, and
//! shutdown all go through it.
//!
//! A worker that returns an error or panics triggers shutdown on its way out, so a
//! single failing thread stops the whole simulation instead of leaving the rest
//! running against a dead consumer. [`Simulator::join`] reports the failure.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::common::{Result, ShutdownSignal, SimError, Sleep};
use crate::config::{Config, GeneratorConfig};
use crate::core::{ControllerContext, ControllerState, InterruptController};
use crate::sim::command::{Command, CommandOutcome};
use crate::sim::events::{EventSink, FanoutSink, TracingSink};
use crate::soc::devices::{Device, DeviceRegistry};
use crate::soc::generator::{InterruptSource, raise_interrupt};
use crate::soc::mask::MaskTable;
use crate::soc::queue::InterruptQueue;
use crate::stats::{SimStats, StatsReport};

/// Name of the controller thread.
pub const CONTROLLER_THREAD: &str = "irq-controller";

/// Triggers shutdown and closes the queue. Safe to call any number of times.
fn halt(shutdown: &ShutdownSignal, queue: &InterruptQueue) -> bool {
    let first = shutdown.trigger();
    queue.close();
    first
}

/// Halts the simulation if the owning worker thread unwinds.
struct HaltOnPanic {
    shutdown: ShutdownSignal,
    queue: Arc<InterruptQueue>,
}

impl Drop for HaltOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            let _ = halt(&self.shutdown, &self.queue);
        }
    }
}

/// Top-level simulator: shared state plus worker handles.
pub struct Simulator {
    registry: Arc<DeviceRegistry>,
    masks: Arc<MaskTable>,
    queue: Arc<InterruptQueue>,
    shutdown: ShutdownSignal,
    stats: Arc<SimStats>,
    sink: Arc<dyn EventSink>,
    controller: Arc<InterruptController>,
    timing: GeneratorConfig,
    seed: Option<u64>,
    workers: Vec<JoinHandle<Result<()>>>,
    controller_started: bool,
    generators_started: bool,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("registry", &self.registry)
            .field("masks", &self.masks.snapshot())
            .field("pending", &self.queue.len())
            .field("controller", &self.controller.state())
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Builds a simulator from `config`. No threads are started yet.
    ///
    /// # Arguments
    ///
    /// * `config` - Device set, generator timing, seed, and initial masks.
    /// * `sink` - Receives every core notification. Notifications are also logged
    ///   through `tracing`.
    pub fn new(config: &Config, sink: Arc<dyn EventSink>) -> Result<Self> {
        let registry = Arc::new(DeviceRegistry::from_config(&config.devices)?);
        config.generator.validate()?;

        let masks = Arc::new(MaskTable::new(&registry));
        for selector in &config.general.initial_masks {
            let device = registry.find(selector)?;
            let _ = masks.set(device.id(), true);
        }

        let sink: Arc<dyn EventSink> = Arc::new(
            FanoutSink::new()
                .with(Arc::new(TracingSink::new(Arc::clone(&registry))))
                .with(sink),
        );
        let queue = Arc::new(InterruptQueue::new());
        let shutdown = ShutdownSignal::new();
        let stats = Arc::new(SimStats::new(registry.len()));
        let controller = Arc::new(InterruptController::new(ControllerContext {
            registry: Arc::clone(&registry),
            masks: Arc::clone(&masks),
            queue: Arc::clone(&queue),
            shutdown: shutdown.clone(),
            sink: Arc::clone(&sink),
            stats: Arc::clone(&stats),
        }));

        Ok(Self {
            registry,
            masks,
            queue,
            shutdown,
            stats,
            sink,
            controller,
            timing: config.generator,
            seed: config.general.seed,
            workers: Vec::new(),
            controller_started: false,
            generators_started: false,
        })
    }

    /// Starts the controller and every generator.
    pub fn start(&mut self) -> Result<()> {
        self.start_controller()?;
        self.start_generators()
    }

    /// Starts only the controller thread.
    ///
    /// Without generators, interrupts arrive only through [`raise`](Self::raise),
    /// which makes the dispatch order fully scripted.
    pub fn start_controller(&mut self) -> Result<()> {
        if self.controller_started {
            return Err(SimError::AlreadyStarted);
        }
        self.controller_started = true;
        let controller = Arc::clone(&self.controller);
        self.spawn_worker(CONTROLLER_THREAD.to_string(), move || controller.run())
    }

    /// Starts one generator thread per device.
    pub fn start_generators(&mut self) -> Result<()> {
        if self.generators_started {
            return Err(SimError::AlreadyStarted);
        }
        self.generators_started = true;
        let devices: Vec<Device> = self.registry.iter().cloned().collect();
        for device in devices {
            let source = InterruptSource::new(
                device,
                self.timing,
                self.seed,
                Arc::clone(&self.queue),
                self.shutdown.clone(),
                Arc::clone(&self.sink),
                Arc::clone(&self.stats),
            );
            let name = format!("irq-src-{}", source.device().label().to_lowercase());
            self.spawn_worker(name, move || source.run())?;
        }
        tracing::info!(
            sources = self.registry.len(),
            "event-driven simulation started"
        );
        Ok(())
    }

    fn spawn_worker<F>(&mut self, name: String, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let guard = HaltOnPanic {
            shutdown: self.shutdown.clone(),
            queue: Arc::clone(&self.queue),
        };
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let result = body();
            if result.is_err() {
                let _ = halt(&guard.shutdown, &guard.queue);
            }
            drop(guard);
            result
        });
        match spawned {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(source) => {
                let _ = self.shutdown();
                Err(SimError::Spawn { name, source })
            }
        }
    }

    /// Flips the mask of the selected device and returns it with its new state.
    ///
    /// The selector is a 1-based index or a label. An unknown selector leaves all
    /// state untouched.
    pub fn toggle_mask(&self, selector: &str) -> Result<(&Device, bool)> {
        let device = self.registry.find(selector)?;
        let masked = self
            .masks
            .toggle(device.id())
            .ok_or_else(|| SimError::UnknownDevice(selector.to_string()))?;
        tracing::info!(
            device = device.label(),
            state = if masked { "MASKED" } else { "ENABLED" },
            "mask toggled"
        );
        Ok((device, masked))
    }

    /// Returns the selected device's current mask state.
    pub fn is_masked(&self, selector: &str) -> Result<bool> {
        let device = self.registry.find(selector)?;
        Ok(self.masks.is_masked(device.id()))
    }

    /// Raises one interrupt for the selected device, as its generator would.
    ///
    /// Fails with [`SimError::ShuttingDown`] once shutdown has closed the queue;
    /// nothing is counted or notified in that case.
    pub fn raise(&self, selector: &str) -> Result<&Device> {
        let device = self.registry.find(selector)?;
        if raise_interrupt(device, &self.queue, self.sink.as_ref(), &self.stats) {
            Ok(device)
        } else {
            Err(SimError::ShuttingDown)
        }
    }

    /// Executes a parsed console command.
    pub fn execute(&self, command: &Command) -> Result<CommandOutcome> {
        match command {
            Command::Toggle(selector) => {
                let (device, masked) = self.toggle_mask(selector)?;
                Ok(CommandOutcome::Toggled {
                    label: device.label().to_string(),
                    masked,
                })
            }
            Command::Raise(selector) => {
                let device = self.raise(selector)?;
                Ok(CommandOutcome::Raised {
                    label: device.label().to_string(),
                })
            }
            Command::Status => Ok(CommandOutcome::Status(self.stats())),
            Command::Help => Ok(CommandOutcome::Help),
            Command::Quit => {
                let _ = self.shutdown();
                Ok(CommandOutcome::Quit)
            }
        }
    }

    /// Signals every worker to stop. Idempotent.
    ///
    /// Returns `true` only for the call that initiated shutdown.
    pub fn shutdown(&self) -> bool {
        let first = halt(&self.shutdown, &self.queue);
        if first {
            tracing::info!("shutting down");
        }
        first
    }

    /// Whether shutdown has been signalled (by a command or a failing worker).
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Blocks for up to `timeout`; returns `true` if shutdown was signalled first.
    ///
    /// A timeout too large to represent waits until shutdown.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shutdown.sleep(timeout) == Sleep::Interrupted
    }

    /// Shuts down and waits for every worker thread.
    ///
    /// Returns the first worker failure, if any. Calling it again is a no-op.
    pub fn join(&mut self) -> Result<()> {
        let _ = self.shutdown();
        let mut first_error = None;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            let outcome = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(SimError::WorkerPanicked(name)),
            };
            if let Err(e) = outcome {
                tracing::error!(error = %e, "worker failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Current counters.
    pub fn stats(&self) -> StatsReport {
        self.stats.snapshot(&self.registry, &self.masks)
    }

    /// Current controller state.
    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    /// The device set.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// The mask table.
    pub fn masks(&self) -> &MaskTable {
        &self.masks
    }

    /// The pending queue.
    pub fn queue(&self) -> &InterruptQueue {
        &self.queue
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            let _ = self.join();
        }
    }
}
