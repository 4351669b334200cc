//! Observer notifications.
//!
//! The core reports what happens to each interrupt through an [`EventSink`].
//! Delivery is one-way and best-effort: a sink that cannot keep up or has lost its
//! receiver never blocks or fails the emitting thread, and nothing a sink does can
//! feed back into controller state.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::soc::devices::{DeviceId, DeviceRegistry};

/// Lifecycle point of an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// A generator enqueued an interrupt.
    Raised(DeviceId),
    /// The controller discarded an interrupt because its device was masked.
    Dropped(DeviceId),
    /// The controller entered the device's ISR.
    Dispatched(DeviceId),
    /// The device's ISR ran to completion.
    Completed(DeviceId),
}

impl Notification {
    /// Device the notification refers to.
    pub const fn device(self) -> DeviceId {
        match self {
            Self::Raised(id) | Self::Dropped(id) | Self::Dispatched(id) | Self::Completed(id) => {
                id
            }
        }
    }
}

/// Receiver of core notifications.
///
/// Called from generator and controller threads; implementations must be cheap
/// and must not block.
pub trait EventSink: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: Notification);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}

/// Forwards notifications over an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Notification>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        // A dropped receiver just means nobody is watching any more.
        let _ = self.tx.send(notification);
    }
}

/// Logs notifications through `tracing`, resolving device labels.
#[derive(Debug, Clone)]
pub struct TracingSink {
    registry: Arc<DeviceRegistry>,
}

impl TracingSink {
    /// Creates a sink that names devices from `registry`.
    pub const fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    fn label(&self, id: DeviceId) -> &str {
        self.registry.get(id).map_or("?", |d| d.label())
    }
}

impl EventSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let device = self.label(notification.device());
        match notification {
            Notification::Raised(_) => tracing::debug!(device, "interrupt raised"),
            Notification::Dropped(_) => tracing::info!(device, "interrupt ignored (masked)"),
            Notification::Dispatched(_) => tracing::info!(device, "interrupt dispatched"),
            Notification::Completed(_) => tracing::info!(device, "isr completed"),
        }
    }
}

/// Delivers every notification to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutSink {
    fn notify(&self, notification: Notification) {
        for sink in &self.sinks {
            sink.notify(notification);
        }
    }
}
