//! Process-wide shutdown signal.
//!
//! Every blocking wait in the simulator that is not a queue dequeue goes through
//! [`ShutdownSignal::sleep`], so a single [`ShutdownSignal::trigger`] wakes all of
//! them at once. The signal is one-shot: once triggered it stays triggered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of an interruptible sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sleep {
    /// The full duration elapsed.
    Elapsed,
    /// Shutdown was signalled before the duration elapsed.
    Interrupted,
}

#[derive(Debug, Default)]
struct Inner {
    /// Lock-free fast path for `is_triggered`.
    flag: AtomicBool,
    /// Authoritative state; condvar waiters re-check it under the lock.
    triggered: Mutex<bool>,
    cvar: Condvar,
}

/// Cloneable handle to the shared shutdown state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers shutdown and wakes every sleeper.
    ///
    /// Returns `true` for the call that actually triggered the signal and `false`
    /// for every later call, which are no-ops.
    pub fn trigger(&self) -> bool {
        let mut triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *triggered {
            return false;
        }
        *triggered = true;
        self.inner.flag.store(true, Ordering::Release);
        self.inner.cvar.notify_all();
        true
    }

    /// Returns whether shutdown has been signalled.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless shutdown is signalled first.
    ///
    /// Spurious condvar wakeups are absorbed: the call only returns early when the
    /// signal has really been triggered.
    ///
    /// A duration too large to form a deadline sleeps until shutdown.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        let Some(deadline) = Instant::now().checked_add(duration) else {
            self.wait();
            return Sleep::Interrupted;
        };
        let mut triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *triggered {
                return Sleep::Interrupted;
            }
            let now = Instant::now();
            if now >= deadline {
                return Sleep::Elapsed;
            }
            let (guard, _) = self
                .inner
                .cvar
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            triggered = guard;
        }
    }

    /// Blocks until shutdown is signalled.
    pub fn wait(&self) {
        let mut triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*triggered {
            triggered = self
                .inner
                .cvar
                .wait(triggered)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
