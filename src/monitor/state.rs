//! Monitor state, connection snapshot and ping bookkeeping

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Where the monitor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorState {
    Idle,
    LookingForDevice,
    ConfirmingDevice,
    Monitoring,
    /// Connected and quiet; a probe goes out when the inactivity timer fires
    WaitingForInactivityTimeout,
}

impl MonitorState {
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            MonitorState::Monitoring | MonitorState::WaitingForInactivityTimeout
        )
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MonitorState::Idle => "idle",
            MonitorState::LookingForDevice => "looking for device",
            MonitorState::ConfirmingDevice => "confirming device",
            MonitorState::Monitoring => "monitoring",
            MonitorState::WaitingForInactivityTimeout => "waiting for inactivity timeout",
        };
        f.write_str(name)
    }
}

/// Indices of the matched device pair, -1 while unmatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub input_index: i32,
    pub output_index: i32,
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self {
            input_index: -1,
            output_index: -1,
        }
    }
}

impl ConnectionSnapshot {
    pub fn is_established(&self) -> bool {
        self.input_index >= 0 && self.output_index >= 0
    }

    pub fn input(&self) -> Option<usize> {
        usize::try_from(self.input_index).ok()
    }

    pub fn output(&self) -> Option<usize> {
        usize::try_from(self.output_index).ok()
    }

    pub(crate) fn set(&mut self, input: usize, output: usize) {
        self.input_index = input as i32;
        self.output_index = output as i32;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Ping ids issued in the current round and the output each went to
#[derive(Debug, Default)]
pub struct PingRegistry {
    pending: BTreeMap<u32, usize>,
}

impl PingRegistry {
    /// Start a round: ids `1..=N`, one per output, in order
    pub fn start_round(&mut self, outputs: &[usize]) -> Vec<(u32, usize)> {
        self.pending.clear();
        outputs
            .iter()
            .enumerate()
            .map(|(i, &output)| {
                let id = i as u32 + 1;
                self.pending.insert(id, output);
                (id, output)
            })
            .collect()
    }

    /// Output a live ping id was sent to
    pub fn output_for(&self, id: u32) -> Option<usize> {
        self.pending.get(&id).copied()
    }

    pub fn remove(&mut self, id: u32) -> Option<usize> {
        self.pending.remove(&id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Progress of a detection round
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DetectRound {
    /// A single candidate pair is being probed
    Confirming { output: usize },
    /// Pings are out to every output; echoing outputs are excluded
    Pinging { excluded: BTreeSet<usize> },
    /// Probing `queue[position]`, one output at a time
    Individual {
        queue: Vec<usize>,
        position: usize,
        calibration: bool,
    },
}

impl DetectRound {
    /// Output the current probe went to, if the round targets a single one
    pub(crate) fn probed_output(&self) -> Option<usize> {
        match self {
            DetectRound::Confirming { output } => Some(*output),
            DetectRound::Individual {
                queue, position, ..
            } => queue.get(*position).copied(),
            DetectRound::Pinging { .. } => None,
        }
    }
}
