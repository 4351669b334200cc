//! Simulation statistics collection and reporting.
//!
//! This module tracks what happened to every interrupt. It provides:
//! 1. **Per-device counters:** Raised, dropped (masked), handled, and aborted interrupts.
//! 2. **Timing:** ISR busy time and queue latency (raise to dispatch).
//! 3. **Invariant tracking:** Peak number of interrupts in service at once.
//! 4. **Reporting:** A serializable [`StatsReport`] snapshot, printed as a table or JSON.
//!
//! Counters are plain atomics updated by generator and controller threads; a
//! snapshot is not a consistent cut across devices, only per counter.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::soc::devices::{DeviceId, DeviceRegistry};
use crate::soc::mask::MaskTable;

/// Counters for a single device.
#[derive(Debug, Default)]
struct DeviceCounters {
    raised: AtomicU64,
    dropped: AtomicU64,
    handled: AtomicU64,
    aborted: AtomicU64,
    busy_ns: AtomicU64,
    latency_ns: AtomicU64,
}

/// Simulation statistics shared by all worker threads.
#[derive(Debug)]
pub struct SimStats {
    start_time: Instant,
    devices: Vec<DeviceCounters>,
    in_service: AtomicUsize,
    peak_in_service: AtomicUsize,
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn millis(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

impl SimStats {
    /// Creates zeroed counters for `devices` sources.
    pub fn new(devices: usize) -> Self {
        Self {
            start_time: Instant::now(),
            devices: (0..devices).map(|_| DeviceCounters::default()).collect(),
            in_service: AtomicUsize::new(0),
            peak_in_service: AtomicUsize::new(0),
        }
    }

    fn counters(&self, id: DeviceId) -> Option<&DeviceCounters> {
        self.devices.get(id.index())
    }

    /// Records an interrupt raised by a generator.
    pub fn record_raised(&self, id: DeviceId) {
        if let Some(c) = self.counters(id) {
            let _ = c.raised.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records an interrupt dropped because its device was masked.
    pub fn record_dropped(&self, id: DeviceId, latency: Duration) {
        if let Some(c) = self.counters(id) {
            let _ = c.dropped.fetch_add(1, Ordering::Relaxed);
            let _ = c.latency_ns.fetch_add(nanos(latency), Ordering::Relaxed);
        }
    }

    /// Marks an ISR as started and returns how many were in service before it.
    ///
    /// The controller is single threaded, so the return value is always zero
    /// unless that invariant has been broken.
    pub fn enter_service(&self, id: DeviceId, latency: Duration) -> usize {
        if let Some(c) = self.counters(id) {
            let _ = c.latency_ns.fetch_add(nanos(latency), Ordering::Relaxed);
        }
        let before = self.in_service.fetch_add(1, Ordering::AcqRel);
        let _ = self.peak_in_service.fetch_max(before + 1, Ordering::AcqRel);
        before
    }

    /// Marks an ISR as finished. `completed` is false when shutdown cut it short.
    pub fn exit_service(&self, id: DeviceId, busy: Duration, completed: bool) {
        if let Some(c) = self.counters(id) {
            let counter = if completed { &c.handled } else { &c.aborted };
            let _ = counter.fetch_add(1, Ordering::Relaxed);
            let _ = c.busy_ns.fetch_add(nanos(busy), Ordering::Relaxed);
        }
        let _ = self.in_service.fetch_sub(1, Ordering::AcqRel);
    }

    /// Number of interrupts currently in service (0 or 1).
    pub fn in_service(&self) -> usize {
        self.in_service.load(Ordering::Acquire)
    }

    /// Highest number of interrupts ever in service at once.
    pub fn peak_in_service(&self) -> usize {
        self.peak_in_service.load(Ordering::Acquire)
    }

    /// Takes a snapshot of all counters, labelled from `registry`.
    pub fn snapshot(&self, registry: &DeviceRegistry, masks: &MaskTable) -> StatsReport {
        let devices: Vec<DeviceReport> = registry
            .iter()
            .zip(&self.devices)
            .map(|(dev, c)| {
                let dropped = c.dropped.load(Ordering::Relaxed);
                let handled = c.handled.load(Ordering::Relaxed);
                let aborted = c.aborted.load(Ordering::Relaxed);
                let served = dropped + handled + aborted;
                let latency_ns = c.latency_ns.load(Ordering::Relaxed);
                DeviceReport {
                    label: dev.label().to_string(),
                    priority: dev.priority(),
                    masked: masks.is_masked(dev.id()),
                    raised: c.raised.load(Ordering::Relaxed),
                    dropped,
                    handled,
                    aborted,
                    busy_ms: millis(c.busy_ns.load(Ordering::Relaxed)),
                    avg_latency_ms: if served == 0 {
                        0.0
                    } else {
                        millis(latency_ns) / served as f64
                    },
                }
            })
            .collect();

        StatsReport {
            uptime_ms: self.start_time.elapsed().as_secs_f64() * 1000.0,
            raised: devices.iter().map(|d| d.raised).sum(),
            dropped: devices.iter().map(|d| d.dropped).sum(),
            handled: devices.iter().map(|d| d.handled).sum(),
            aborted: devices.iter().map(|d| d.aborted).sum(),
            peak_in_service: self.peak_in_service(),
            devices,
        }
    }
}

/// Per-device row of a [`StatsReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    /// Device label.
    pub label: String,
    /// Priority rank.
    pub priority: u32,
    /// Mask state at snapshot time.
    pub masked: bool,
    /// Interrupts raised by the device's generator.
    pub raised: u64,
    /// Interrupts dropped because the device was masked.
    pub dropped: u64,
    /// ISRs run to completion.
    pub handled: u64,
    /// ISRs cut short by shutdown.
    pub aborted: u64,
    /// Total time spent in this device's ISR.
    pub busy_ms: f64,
    /// Average time from raise to dequeue.
    pub avg_latency_ms: f64,
}

/// Point-in-time view of the simulation counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Wall-clock time since the statistics were created.
    pub uptime_ms: f64,
    /// Total interrupts raised.
    pub raised: u64,
    /// Total interrupts dropped.
    pub dropped: u64,
    /// Total ISRs completed.
    pub handled: u64,
    /// Total ISRs aborted by shutdown.
    pub aborted: u64,
    /// Highest number of simultaneous ISRs observed (must be at most 1).
    pub peak_in_service: usize,
    /// Per-device breakdown, in registry order.
    pub devices: Vec<DeviceReport>,
}

impl StatsReport {
    /// Renders the report as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Prints the report to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl std::fmt::Display for StatsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==========================================================")?;
        writeln!(f, "INTERRUPT CONTROLLER STATISTICS")?;
        writeln!(f, "==========================================================")?;
        writeln!(f, "host_seconds             {:.4} s", self.uptime_ms / 1000.0)?;
        writeln!(f, "irq.raised               {}", self.raised)?;
        writeln!(f, "irq.dropped              {}", self.dropped)?;
        writeln!(f, "irq.handled              {}", self.handled)?;
        writeln!(f, "irq.aborted              {}", self.aborted)?;
        writeln!(f, "irq.peak_in_service      {}", self.peak_in_service)?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "DEVICES")?;
        for d in &self.devices {
            writeln!(
                f,
                "  {:<10} prio {:<3} {:<7} raised: {:<6} | dropped: {:<6} | handled: {:<6} | avg_wait: {:.1} ms",
                d.label,
                d.priority,
                if d.masked { "MASKED" } else { "enabled" },
                d.raised,
                d.dropped,
                d.handled,
                d.avg_latency_ms
            )?;
        }
        write!(f, "==========================================================")
    }
}
