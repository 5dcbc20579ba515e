//! Single-slot scheduled wake-up

use std::time::{Duration, Instant};

/// What the monitor should do when the timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Start a detection round
    Detect,
    /// The current detection probe went unanswered
    RoundTimeout,
    /// The connected device has been quiet long enough to be probed
    Inactivity,
    /// The liveness probe went unanswered
    ProbeTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    pub at: Instant,
    pub reason: WakeReason,
}

/// At most one pending wake; arming replaces it
#[derive(Debug, Default)]
pub struct Timer {
    slot: Option<Wake>,
}

impl Timer {
    pub fn arm(&mut self, now: Instant, delay: Duration, reason: WakeReason) {
        self.slot = Some(Wake {
            at: now + delay,
            reason,
        });
    }

    pub fn cancel(&mut self) {
        self.slot = None;
    }

    pub fn pending(&self) -> Option<Wake> {
        self.slot
    }

    /// Disarm and return the reason if the wake is due
    pub fn take_due(&mut self, now: Instant) -> Option<WakeReason> {
        match self.slot {
            Some(wake) if wake.at <= now => {
                self.slot = None;
                Some(wake.reason)
            }
            _ => None,
        }
    }
}
