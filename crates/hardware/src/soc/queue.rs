//! Pending interrupt queue.
//!
//! An unbounded priority queue shared between the generators (producers) and the
//! controller (single consumer). It provides:
//! 1. **Ordering:** Ascending priority rank; events of one device leave in the
//!    order they arrived, tracked by a sequence number assigned under the lock.
//! 2. **Blocking dequeue:** The consumer parks on a condvar until an event arrives
//!    or the queue is closed.
//! 3. **Close:** Wakes every waiter; later dequeues return [`Dequeued::Closed`]
//!    immediately and later enqueues are discarded.
//!
//! The single mutex is the only serialization point between producers and the
//! consumer.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::soc::devices::{Device, DeviceId};

/// One raised interrupt request.
///
/// Carries the originating device and its rank. The sequence number is stamped by
/// [`InterruptQueue::enqueue`] and only orders events of equal rank.
#[derive(Debug)]
pub struct InterruptEvent {
    device: DeviceId,
    priority: u32,
    seq: u64,
    raised_at: Instant,
}

impl InterruptEvent {
    /// Raises a new event for `device`, timestamped now.
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.id(),
            priority: device.priority(),
            seq: 0,
            raised_at: Instant::now(),
        }
    }

    /// Originating device.
    #[inline]
    pub const fn device(&self) -> DeviceId {
        self.device
    }

    /// Priority rank copied from the device at raise time.
    #[inline]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Enqueue order, unique per queue.
    #[inline]
    pub const fn sequence(&self) -> u64 {
        self.seq
    }

    /// Instant the event was raised.
    #[inline]
    pub const fn raised_at(&self) -> Instant {
        self.raised_at
    }

    /// Time spent waiting since the event was raised.
    pub fn age(&self) -> Duration {
        self.raised_at.elapsed()
    }
}

/// Heap entry: `BinaryHeap` is a max-heap, so the comparison is reversed to pop
/// the lowest `(priority, seq)` first.
#[derive(Debug)]
struct Entry(InterruptEvent);

impl Entry {
    const fn key(&self) -> (u32, u64) {
        (self.0.priority, self.0.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

#[derive(Debug, Default)]
struct State {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    closed: bool,
}

/// Result of a blocking dequeue.
#[derive(Debug)]
pub enum Dequeued {
    /// The highest-priority pending event.
    Event(InterruptEvent),
    /// The queue was closed by shutdown.
    Closed,
}

/// Unbounded, blocking priority queue of pending interrupts.
#[derive(Debug, Default)]
pub struct InterruptQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl InterruptQueue {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an event. Never blocks; events offered after [`close`](Self::close)
    /// are dropped.
    pub fn enqueue(&self, event: InterruptEvent) {
        let _ = self.enqueue_with(event, || {});
    }

    /// Inserts an event, running `admitted` first if the queue is still open.
    ///
    /// `admitted` runs under the queue lock, before the consumer can see the
    /// event, so it must be short and must not touch the queue. Returns `false`
    /// (without calling `admitted`) when the queue is closed.
    pub fn enqueue_with<F: FnOnce()>(&self, mut event: InterruptEvent, admitted: F) -> bool {
        let mut state = self.lock();
        if state.closed {
            tracing::trace!(device = %event.device, "enqueue after close discarded");
            return false;
        }
        admitted();
        event.seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Entry(event));
        drop(state);
        self.available.notify_one();
        true
    }

    /// Removes the most urgent event, blocking while the queue is empty.
    ///
    /// Returns [`Dequeued::Closed`] as soon as the queue is closed, even if events
    /// are still pending.
    pub fn dequeue_blocking(&self) -> Dequeued {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Dequeued::Closed;
            }
            if let Some(Entry(event)) = state.heap.pop() {
                return Dequeued::Event(event);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes the most urgent event without blocking.
    pub fn try_dequeue(&self) -> Option<InterruptEvent> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.heap.pop().map(|Entry(event)| event)
    }

    /// Closes the queue and wakes every waiter. Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let discarded = state.heap.len();
        state.heap.clear();
        drop(state);
        if discarded > 0 {
            tracing::debug!(discarded, "queue closed with pending events");
        }
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }
}
