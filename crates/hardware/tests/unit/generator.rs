//! Interrupt Source Tests.
//!
//! Verifies inter-arrival timing, seeding, and the run loop's reaction to
//! shutdown.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use irqsim_core::common::ShutdownSignal;
use irqsim_core::config::{DeviceConfig, GeneratorConfig};
use irqsim_core::sim::Notification;
use irqsim_core::sim::events::EventSink;
use irqsim_core::soc::{
    Device, DeviceId, DeviceRegistry, InterruptQueue, InterruptSource, MaskTable,
};
use irqsim_core::stats::SimStats;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::sink::RecordingSink;

struct SourceRig {
    queue: Arc<InterruptQueue>,
    shutdown: ShutdownSignal,
    sink: Arc<RecordingSink>,
    stats: Arc<SimStats>,
}

impl SourceRig {
    fn new() -> Self {
        Self {
            queue: Arc::new(InterruptQueue::new()),
            shutdown: ShutdownSignal::new(),
            sink: Arc::new(RecordingSink::new()),
            stats: Arc::new(SimStats::new(4)),
        }
    }

    fn source(&self, idx: usize, timing: GeneratorConfig, seed: Option<u64>) -> InterruptSource {
        let device = Device::new(DeviceId(idx), idx as u32, format!("dev{idx}"), Duration::ZERO);
        InterruptSource::new(
            device,
            timing,
            seed,
            Arc::clone(&self.queue),
            self.shutdown.clone(),
            Arc::clone(&self.sink) as Arc<dyn EventSink>,
            Arc::clone(&self.stats),
        )
    }
}

fn total_raised(rig: &SourceRig) -> u64 {
    let devices: Vec<DeviceConfig> = (0..4)
        .map(|i| DeviceConfig {
            label: format!("dev{i}"),
            priority: i as u32,
            handler_ms: 0,
        })
        .collect();
    let registry = DeviceRegistry::from_config(&devices).expect("valid devices");
    let masks = MaskTable::new(&registry);
    rig.stats.snapshot(&registry, &masks).raised
}

fn timing(min_interval_ms: u64, interval_range_ms: u64) -> GeneratorConfig {
    GeneratorConfig {
        min_interval_ms,
        interval_range_ms,
    }
}

#[rstest]
#[case(1000, 2000)]
#[case(5, 1)]
#[case(0, 50)]
#[case(20, 0)]
fn generator_interval_stays_in_window(#[case] min_ms: u64, #[case] range_ms: u64) {
    let rig = SourceRig::new();
    let mut source = rig.source(0, timing(min_ms, range_ms), Some(11));
    let lo = Duration::from_millis(min_ms);
    let hi = Duration::from_millis(min_ms + range_ms.max(1));

    for _ in 0..500 {
        let interval = source.next_interval();
        assert!(interval >= lo && interval < hi, "{interval:?} outside [{lo:?}, {hi:?})");
    }
}

#[test]
fn generator_same_seed_same_intervals() {
    let rig = SourceRig::new();
    let mut a = rig.source(1, timing(0, 1_000), Some(42));
    let mut b = rig.source(1, timing(0, 1_000), Some(42));

    let xs: Vec<Duration> = (0..16).map(|_| a.next_interval()).collect();
    let ys: Vec<Duration> = (0..16).map(|_| b.next_interval()).collect();
    assert_eq!(xs, ys);
}

#[test]
fn generator_devices_get_distinct_streams() {
    let rig = SourceRig::new();
    let mut a = rig.source(0, timing(0, 1_000_000), Some(42));
    let mut b = rig.source(1, timing(0, 1_000_000), Some(42));

    let xs: Vec<Duration> = (0..16).map(|_| a.next_interval()).collect();
    let ys: Vec<Duration> = (0..16).map(|_| b.next_interval()).collect();
    assert_ne!(xs, ys);
}

#[test]
fn generator_raise_notifies_then_enqueues() {
    let rig = SourceRig::new();
    let source = rig.source(2, timing(1, 1), None);
    assert!(source.raise());

    assert_eq!(rig.sink.events(), vec![Notification::Raised(DeviceId(2))]);
    assert_eq!(rig.queue.len(), 1);
    assert_eq!(source.device().id(), DeviceId(2));
}

#[test]
fn generator_keeps_raising_until_shutdown() {
    let rig = SourceRig::new();
    let source = rig.source(0, timing(2, 3), Some(5));
    let worker = thread::spawn(move || source.run());

    assert!(rig.sink.wait_for(Duration::from_secs(5), |log| log.len() >= 5));
    let start = Instant::now();
    let _ = rig.shutdown.trigger();
    worker.join().expect("source panicked").expect("clean exit");

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(rig.queue.len() >= 5);
}

#[test]
fn generator_long_sleep_is_cut_short_by_shutdown() {
    let rig = SourceRig::new();
    let source = rig.source(0, timing(60_000, 0), None);
    let worker = thread::spawn(move || source.run());

    thread::sleep(Duration::from_millis(20));
    let start = Instant::now();
    let _ = rig.shutdown.trigger();
    worker.join().expect("source panicked").expect("clean exit");

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(rig.sink.events().is_empty());
}

#[test]
fn generator_raise_after_close_records_nothing() {
    let rig = SourceRig::new();
    rig.queue.close();
    let source = rig.source(0, timing(1, 1), None);

    assert!(!source.raise());
    assert!(rig.queue.is_empty());
    assert!(rig.sink.events().is_empty());
    assert_eq!(total_raised(&rig), 0);
}

#[test]
fn generator_stops_when_queue_closes_under_it() {
    let rig = SourceRig::new();
    let source = rig.source(0, timing(1, 1), None);
    rig.queue.close();
    let worker = thread::spawn(move || source.run());

    let start = Instant::now();
    worker.join().expect("source panicked").expect("clean exit");
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(rig.sink.events().is_empty());
}
