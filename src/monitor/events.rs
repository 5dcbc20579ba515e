//! Monitor events and the shared status board

use std::sync::Arc;

use parking_lot::RwLock;

use super::state::{ConnectionSnapshot, MonitorState};
use crate::firmware::{FirmwareVersion, Release};

/// Something listeners may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    ConnectionEstablished {
        input_index: usize,
        output_index: usize,
    },
    ConnectionLost,
    /// A full detection round found nothing
    ConnectionFailed,
    FirmwareVersionResolved {
        version: FirmwareVersion,
        release: Release,
    },
    StateChanged(MonitorState),
}

/// Callback type for monitor event subscribers
pub type EventCallback = Arc<dyn Fn(&MonitorEvent) + Send + Sync>;

/// Point-in-time view of the monitor, readable from other threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub snapshot: ConnectionSnapshot,
    pub firmware: Option<FirmwareVersion>,
    pub release: Release,
    pub input_name: Option<String>,
    pub output_name: Option<String>,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            state: MonitorState::Idle,
            snapshot: ConnectionSnapshot::default(),
            firmware: None,
            release: Release::Unknown,
            input_name: None,
            output_name: None,
        }
    }
}

/// Cloneable read handle on the monitor's latest status
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<MonitorStatus>>,
}

impl StatusBoard {
    pub fn current(&self) -> MonitorStatus {
        self.inner.read().clone()
    }

    pub(crate) fn publish(&self, status: MonitorStatus) {
        *self.inner.write() = status;
    }
}

/// Subscriber list owned by the monitor
#[derive(Default)]
pub(crate) struct EventBus {
    callbacks: Arc<RwLock<Vec<EventCallback>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self, callback: EventCallback) {
        self.callbacks.write().push(callback);
    }

    pub(crate) fn emit(&self, event: MonitorEvent) {
        for callback in self.callbacks.read().iter() {
            callback(&event);
        }
    }
}
